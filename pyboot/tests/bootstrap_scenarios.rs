//! End-to-end bootstrap scenarios driven through `run_bootstrap`.
//!
//! Every shell action goes to a `ScriptedShell`, so these tests cover the
//! orchestration order and retry accounting without spawning processes.

use pyboot::bootstrap::{BootstrapRequest, run_bootstrap};
use pyboot::core::budget::RetryBudget;
use pyboot::core::classifier::PhraseClassifier;
use pyboot::core::types::{Phase, RunVerdict};
use pyboot::error::BootstrapError;
use pyboot::io::config::BootstrapConfig;
use pyboot::test_support::{ScriptedShell, TestProject, fail, killed_after, ok};

fn request(project: &TestProject, entry: Option<&str>) -> BootstrapRequest {
    BootstrapRequest {
        project: project.path().to_path_buf(),
        entry: entry.map(str::to_string),
    }
}

/// Only `main.py`, no manifest: select it, install nothing, run it once.
#[test]
fn single_script_runs_once() {
    let project = TestProject::new().expect("project");
    project.write("main.py", "print('hi')\n").expect("write");
    let shell = ScriptedShell::new().on("python main.py", vec![ok()]);

    let state = run_bootstrap(
        &request(&project, None),
        &BootstrapConfig::default(),
        &shell,
        &PhraseClassifier,
    )
    .expect("bootstrap");

    assert_eq!(state.entry.as_deref(), Some("main.py"));
    assert!(state.installs.is_empty());
    assert_eq!(shell.commands(), vec!["python main.py"]);
    let probe = state.probe.expect("probe");
    assert_eq!(probe.verdict, RunVerdict::Succeeded);
    assert_eq!(probe.attempts, 1);
}

/// Two scripts and no conventional name: nothing may run.
#[test]
fn ambiguous_scripts_abort_before_any_action() {
    let project = TestProject::new().expect("project");
    project.write("a.py", "").expect("write");
    project.write("b.py", "").expect("write");
    let shell = ScriptedShell::new();

    let err = run_bootstrap(
        &request(&project, None),
        &BootstrapConfig::default(),
        &shell,
        &PhraseClassifier,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BootstrapError>(),
        Some(BootstrapError::AmbiguousEntry { .. })
    ));
    assert!(shell.commands().is_empty());
}

/// `torch` in the manifest with a CUDA request: accelerator build first.
#[test]
fn accelerator_build_precedes_manifest_install() {
    let project = TestProject::new().expect("project");
    project.write("train.py", "import numpy\n").expect("write");
    project
        .write("requirements.txt", "numpy==1.26\ntorch\n")
        .expect("write");
    let shell = ScriptedShell::new();
    let cfg = BootstrapConfig {
        cuda: Some("11.8".to_string()),
        ..BootstrapConfig::default()
    };

    let state =
        run_bootstrap(&request(&project, None), &cfg, &shell, &PhraseClassifier).expect("bootstrap");

    let accelerator = shell.position("whl/cu118").expect("accelerator install");
    let manifest = shell.position("-r requirements.txt").expect("manifest install");
    assert!(accelerator < manifest);
    assert!(shell.commands()[accelerator].contains("torch torchvision torchaudio"));
    let phases: Vec<Phase> = state.installs.iter().map(|(phase, _)| *phase).collect();
    assert_eq!(phases, vec![Phase::Accelerator, Phase::Manifest, Phase::Inferred]);
}

#[test]
fn unsupported_accelerator_aborts_before_any_action() {
    let project = TestProject::new().expect("project");
    project.write("main.py", "").expect("write");
    let shell = ScriptedShell::new();
    let cfg = BootstrapConfig {
        cuda: Some("10.2".to_string()),
        ..BootstrapConfig::default()
    };

    let err = run_bootstrap(&request(&project, None), &cfg, &shell, &PhraseClassifier).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BootstrapError>(),
        Some(BootstrapError::UnsupportedAcceleratorVersion { .. })
    ));
    assert!(shell.commands().is_empty());
}

/// Missing `PIL`: install `Pillow`, rerun, no run retry charged.
#[test]
fn missing_module_is_translated_installed_and_rerun() {
    let project = TestProject::new().expect("project");
    project.write("app.py", "").expect("write");
    let shell = ScriptedShell::new().on(
        "python app.py",
        vec![
            fail("Traceback (most recent call last):\nModuleNotFoundError: No module named 'PIL'\n"),
            ok(),
        ],
    );
    let cfg = BootstrapConfig {
        dep_retries: RetryBudget::limited(0),
        ..BootstrapConfig::default()
    };

    let state =
        run_bootstrap(&request(&project, Some("app")), &cfg, &shell, &PhraseClassifier).expect("bootstrap");

    assert_eq!(
        shell.commands(),
        vec!["python app.py", "python -m pip install Pillow", "python app.py"]
    );
    let probe = state.probe.expect("probe");
    assert_eq!(probe.retries, 0);
    assert_eq!(probe.healed, vec!["Pillow"]);
}

#[test]
fn long_running_entry_counts_as_success() {
    let project = TestProject::new().expect("project");
    project.write("server.py", "").expect("write");
    let shell = ScriptedShell::new().on("python server.py", vec![killed_after(300)]);

    let state = run_bootstrap(
        &request(&project, None),
        &BootstrapConfig::default(),
        &shell,
        &PhraseClassifier,
    )
    .expect("bootstrap");

    assert_eq!(state.probe.expect("probe").verdict, RunVerdict::Survived);
}

#[cfg(unix)]
#[test]
fn conda_session_runs_everything_inside_the_prefix() {
    let project = TestProject::new().expect("project");
    project.write("main.py", "import yaml\n").expect("write");
    project.write("requirements.txt", "pyyaml\n").expect("write");
    let shell = ScriptedShell::new();
    let cfg = BootstrapConfig {
        conda: true,
        python_version: Some("3.10".to_string()),
        ..BootstrapConfig::default()
    };

    let state =
        run_bootstrap(&request(&project, None), &cfg, &shell, &PhraseClassifier).expect("bootstrap");

    assert!(state.environment_ready);
    let commands = shell.commands();
    assert_eq!(commands[0], "conda create --prefix ./venv python=3.10 -y");
    assert!(commands[1..].iter().all(|c| c.contains("--prefix ./venv")));
}
