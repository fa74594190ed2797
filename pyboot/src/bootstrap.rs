//! Orchestration for one bootstrap session.
//!
//! `SelectEntry -> [CreateEnvironment] -> InstallManifest -> InstallInferred ->
//! RunProbe`. Install phases are attempted, never guaranteed: their failures
//! are logged and the run-probe decides overall success.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::core::classifier::OutcomeClassifier;
use crate::core::types::{InstallReport, Phase};
use crate::error::BootstrapError;
use crate::install::{ExecSettings, Installer};
use crate::io::config::BootstrapConfig;
use crate::io::shell::Shell;
use crate::io::toolchain::Interpreter;
use crate::plan::{InstallPlan, build_plan};
use crate::probe::{ProbeReport, ProbeSettings, RunProbe};
use crate::select::select_entry;

/// What to bootstrap.
#[derive(Debug, Clone)]
pub struct BootstrapRequest {
    pub project: PathBuf,
    /// Entry named on the command line; auto-selected when `None`.
    pub entry: Option<String>,
}

/// Mutable record of one session, threaded through every phase.
#[derive(Debug, Clone, Default)]
pub struct BootstrapState {
    pub entry: Option<String>,
    /// An isolated environment exists, either found or created.
    pub environment_ready: bool,
    /// Interpreter every install after environment creation and the run used.
    pub interpreter: Option<Interpreter>,
    pub plan: Option<InstallPlan>,
    /// One report per executed action, in order.
    pub installs: Vec<(Phase, InstallReport)>,
    pub probe: Option<ProbeReport>,
}

impl BootstrapState {
    pub fn failed_installs(&self) -> impl Iterator<Item = &InstallReport> {
        self.installs
            .iter()
            .map(|(_, report)| report)
            .filter(|report| !report.succeeded)
    }
}

/// Dry-run view printed by `--plan`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanPreview {
    pub entry: String,
    pub plan: InstallPlan,
}

/// Select the entry and build the plan without executing anything.
pub fn preview(request: &BootstrapRequest, cfg: &BootstrapConfig) -> Result<PlanPreview> {
    let entry = select_entry(&request.project, request.entry.as_deref())?;
    let plan = build_plan(&request.project, cfg, &Interpreter::from_config(cfg))?;
    Ok(PlanPreview { entry, plan })
}

/// Run a full bootstrap session.
///
/// Fatal selection and configuration errors abort before any action runs.
/// An exhausted run budget surfaces as [`BootstrapError::RetryBudgetExhausted`].
#[instrument(skip_all, fields(project = %request.project.display()))]
pub fn run_bootstrap<S: Shell, C: OutcomeClassifier>(
    request: &BootstrapRequest,
    cfg: &BootstrapConfig,
    shell: &S,
    classifier: &C,
) -> Result<BootstrapState> {
    let root = request.project.as_path();
    let mut state = BootstrapState::default();

    let entry = select_entry(root, request.entry.as_deref())?;
    println!("Selected entry point {entry}");
    state.entry = Some(entry.clone());

    let requested = Interpreter::from_config(cfg);
    let mut plan = build_plan(root, cfg, &requested)?;
    let exec = exec_settings(root, cfg);
    let installer = Installer::new(shell, classifier, &exec);

    run_phase(&installer, &plan, Phase::ReadmeImmediate, &mut state)?;
    if cfg.conda {
        create_environment(&installer, &plan, &mut state)?;
    }

    let interpreter = resolve_interpreter(cfg, &state, requested.clone());
    if interpreter != requested {
        plan = build_plan(root, cfg, &interpreter)?;
    }
    for phase in [
        Phase::ReadmeDeferred,
        Phase::Accelerator,
        Phase::Manifest,
        Phase::Inferred,
    ] {
        run_phase(&installer, &plan, phase, &mut state)?;
    }
    state.plan = Some(plan);
    state.interpreter = Some(interpreter.clone());

    let failed = state.failed_installs().count();
    if failed > 0 {
        warn!(failed, "some install actions failed, continuing to run-probe");
    }

    let probe_settings = ProbeSettings {
        wait: cfg.wait(),
        run_budget: cfg.dep_retries,
        heal_budget: cfg.dep_retries,
        heal_limit: cfg.max_heals_per_module,
    };
    let report =
        RunProbe::new(shell, classifier, &exec, &interpreter, &probe_settings).run(&entry)?;
    let succeeded = report.succeeded();
    let retries = report.retries;
    state.probe = Some(report);

    if !succeeded {
        return Err(BootstrapError::RetryBudgetExhausted { entry, retries }.into());
    }
    println!("Environment setup of {entry} succeeded");
    info!(entry = %entry, "bootstrap succeeded");
    Ok(state)
}

/// The isolated interpreter if its environment is ready, else the global one.
fn resolve_interpreter(
    cfg: &BootstrapConfig,
    state: &BootstrapState,
    requested: Interpreter,
) -> Interpreter {
    if cfg.conda && !state.environment_ready {
        warn!("isolated environment unavailable, falling back to the global interpreter");
        return Interpreter::global(cfg);
    }
    requested
}

fn exec_settings(root: &Path, cfg: &BootstrapConfig) -> ExecSettings {
    ExecSettings {
        workdir: root.to_path_buf(),
        timeout: cfg.install_timeout(),
        output_limit_bytes: cfg.output_limit_bytes,
    }
}

fn run_phase<S: Shell, C: OutcomeClassifier>(
    installer: &Installer<'_, S, C>,
    plan: &InstallPlan,
    phase: Phase,
    state: &mut BootstrapState,
) -> Result<()> {
    for action in plan.phase(phase) {
        let report = installer.run(action)?;
        if !report.succeeded {
            warn!(%phase, label = %report.label, "install failed, proceeding");
        }
        state.installs.push((phase, report));
    }
    Ok(())
}

/// Alternatives in order; the first success wins. Total failure only warns.
fn create_environment<S: Shell, C: OutcomeClassifier>(
    installer: &Installer<'_, S, C>,
    plan: &InstallPlan,
    state: &mut BootstrapState,
) -> Result<()> {
    if plan.environment_exists {
        println!("Environment already exists, skip creation");
        state.environment_ready = true;
        return Ok(());
    }
    for action in plan.phase(Phase::Environment) {
        let report = installer.run(action)?;
        let succeeded = report.succeeded;
        state.installs.push((Phase::Environment, report));
        if succeeded {
            state.environment_ready = true;
            return Ok(());
        }
    }
    println!("Environment creation failed, continuing with whatever interpreter resolves");
    warn!("every environment creation alternative failed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::budget::RetryBudget;
    use crate::core::classifier::PhraseClassifier;
    use crate::test_support::{ScriptedShell, TestProject, fail, ok};

    fn request(project: &TestProject) -> BootstrapRequest {
        BootstrapRequest {
            project: project.path().to_path_buf(),
            entry: None,
        }
    }

    fn conda() -> BootstrapConfig {
        BootstrapConfig {
            conda: true,
            env_retries: RetryBudget::limited(0),
            ..BootstrapConfig::default()
        }
    }

    #[test]
    fn environment_file_success_skips_bare_creation() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        project.write("environment.yml", "name: x\n").expect("write");
        let shell = ScriptedShell::new();
        let state =
            run_bootstrap(&request(&project), &conda(), &shell, &PhraseClassifier).expect("run");
        assert!(state.environment_ready);
        assert_eq!(shell.count("conda env create"), 1);
        assert_eq!(shell.count("conda create"), 0);
    }

    #[test]
    fn environment_falls_back_to_bare_creation() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        project.write("environment.yaml", "name: x\n").expect("write");
        let shell = ScriptedShell::new().on("conda env create", vec![fail("ResolvePackageNotFound")]);
        let state =
            run_bootstrap(&request(&project), &conda(), &shell, &PhraseClassifier).expect("run");
        assert!(state.environment_ready);
        assert_eq!(
            shell.commands()[..2],
            [
                "conda env create -f environment.yaml --prefix ./venv",
                "conda create --prefix ./venv python=3.12 -y",
            ]
        );
    }

    #[test]
    fn environment_failure_is_soft() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        let shell = ScriptedShell::new().on("conda create", vec![fail("CondaHTTPError")]);
        let state =
            run_bootstrap(&request(&project), &conda(), &shell, &PhraseClassifier).expect("run");
        assert!(!state.environment_ready);
        assert_eq!(state.failed_installs().count(), 1);
        assert!(state.probe.expect("probe").succeeded());
    }

    #[test]
    fn failed_environment_falls_back_to_global_interpreter() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        project.write("requirements.txt", "flask\n").expect("write");
        let shell = ScriptedShell::new().on("conda create", vec![fail("CondaHTTPError")]);
        let state =
            run_bootstrap(&request(&project), &conda(), &shell, &PhraseClassifier).expect("run");
        assert!(!state.environment_ready);
        assert_eq!(
            state.interpreter,
            Some(Interpreter::Global {
                python: "python".to_string()
            })
        );
        let commands = shell.commands();
        assert_eq!(
            commands[1..],
            ["python -m pip install -r requirements.txt", "python main.py"]
        );
    }

    #[test]
    fn existing_environment_is_reused() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        project.mkdir("venv").expect("mkdir");
        let shell = ScriptedShell::new();
        let state =
            run_bootstrap(&request(&project), &conda(), &shell, &PhraseClassifier).expect("run");
        assert!(state.environment_ready);
        assert_eq!(shell.count("conda create"), 0);
    }

    #[test]
    fn readme_immediate_runs_before_environment_and_deferred_after() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        project
            .write(
                "README.md",
                "```bash\n$ git clone https://example.invalid/x/helper\n```\n\n```\npip install rich\n```\n",
            )
            .expect("write");
        let shell = ScriptedShell::new();
        run_bootstrap(&request(&project), &conda(), &shell, &PhraseClassifier).expect("run");
        let clone = shell.position("git clone").expect("clone");
        let create = shell.position("conda create").expect("create");
        let deferred = shell.position("pip install rich").expect("deferred");
        assert!(clone < create && create < deferred);
    }

    #[test]
    fn failed_installs_do_not_stop_later_phases() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "import requests\n").expect("write");
        project.write("requirements.txt", "flask\n").expect("write");
        let shell = ScriptedShell::new().on("-r requirements.txt", vec![fail("ERROR")]);
        let cfg = BootstrapConfig {
            env_retries: RetryBudget::limited(1),
            ..BootstrapConfig::default()
        };
        let state = run_bootstrap(&request(&project), &cfg, &shell, &PhraseClassifier).expect("run");
        assert_eq!(shell.count("-r requirements.txt"), 2);
        assert_eq!(shell.count("pip install requests"), 1);
        assert_eq!(state.failed_installs().count(), 1);
    }

    #[test]
    fn exhausted_run_budget_is_fatal() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        let shell = ScriptedShell::new().on("python main.py", vec![fail("SyntaxError")]);
        let cfg = BootstrapConfig {
            dep_retries: RetryBudget::limited(2),
            ..BootstrapConfig::default()
        };
        let err = run_bootstrap(&request(&project), &cfg, &shell, &PhraseClassifier).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BootstrapError>(),
            Some(&BootstrapError::RetryBudgetExhausted {
                entry: "main.py".to_string(),
                retries: 3,
            })
        );
        assert_eq!(shell.count("python main.py"), 3);
    }

    #[test]
    fn actions_run_in_project_directory() {
        let project = TestProject::new().expect("project");
        project.write("main.py", "").expect("write");
        let shell = ScriptedShell::new().on("python main.py", vec![ok()]);
        run_bootstrap(&request(&project), &BootstrapConfig::default(), &shell, &PhraseClassifier)
            .expect("run");
        assert!(shell.requests().iter().all(|r| r.workdir == project.path()));
    }

    #[test]
    fn preview_executes_nothing() {
        let project = TestProject::new().expect("project");
        project.write("run.py", "import yaml\n").expect("write");
        project.write("util.py", "").expect("write");
        let preview = preview(&request(&project), &BootstrapConfig::default()).expect("preview");
        assert_eq!(preview.entry, "run.py");
        assert_eq!(preview.plan.actions.len(), 1);
        assert_eq!(preview.plan.actions[0].action.label, "Install module PyYAML");
    }
}
