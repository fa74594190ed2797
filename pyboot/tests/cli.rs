//! CLI tests for the `pyboot` binary.
//!
//! Spawns the binary and verifies exit codes for paths that never reach a
//! real interpreter.

use std::process::Command;

use pyboot::exit_codes;
use pyboot::test_support::TestProject;

#[test]
fn ambiguous_entry_exits_with_failed_code() {
    let project = TestProject::new().expect("project");
    project.write("a.py", "").expect("write");
    project.write("b.py", "").expect("write");

    let output = Command::new(env!("CARGO_BIN_EXE_pyboot"))
        .arg("--project")
        .arg(project.path())
        .output()
        .expect("pyboot");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("please specify the entry point manually"));
}

#[test]
fn missing_explicit_entry_exits_with_failed_code() {
    let project = TestProject::new().expect("project");

    let status = Command::new(env!("CARGO_BIN_EXE_pyboot"))
        .current_dir(project.path())
        .arg("app")
        .status()
        .expect("pyboot");

    assert_eq!(status.code(), Some(exit_codes::FAILED));
}

#[test]
fn plan_prints_without_executing() {
    let project = TestProject::new().expect("project");
    project.write("main.py", "import cv2\n").expect("write");
    project.write("requirements.txt", "torch\n").expect("write");

    let output = Command::new(env!("CARGO_BIN_EXE_pyboot"))
        .current_dir(project.path())
        .args(["--plan", "--cuda", "12.1", "--retry", "-1"])
        .output()
        .expect("pyboot");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).expect("plan json");
    assert_eq!(plan["entry"], "main.py");
    let actions = plan["plan"]["actions"].as_array().expect("actions");
    let phases: Vec<&str> = actions
        .iter()
        .filter_map(|a| a["phase"].as_str())
        .collect();
    assert_eq!(phases, vec!["accelerator", "manifest", "inferred"]);
    assert_eq!(actions[2]["label"], "Install module opencv-python");
    assert_eq!(actions[2]["max_retries"], -1);
    assert!(!project.path().join("venv").exists());
}

#[test]
fn invalid_budget_is_rejected() {
    let project = TestProject::new().expect("project");
    project.write("main.py", "").expect("write");

    let status = Command::new(env!("CARGO_BIN_EXE_pyboot"))
        .current_dir(project.path())
        .args(["--plan", "--retry", "-3"])
        .status()
        .expect("pyboot");

    assert_eq!(status.code(), Some(exit_codes::FAILED));
}

