//! Install-obligation discovery.
//!
//! Scans README prose, environment definitions, `requirements.txt` and the
//! project's own imports, and turns them into an ordered [`InstallPlan`].
//! Building a plan reads files but never executes anything.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::accelerator::{FRAMEWORK_PACKAGES, build_tag, index_url, needs_accelerator_build};
use crate::core::aliases::install_name;
use crate::core::imports::{first_import, is_stdlib, top_level};
use crate::core::manifest::requirement_names;
use crate::core::readme::{ReadmeFacts, extract, pip_install_args};
use crate::core::types::{InstallAction, Phase};
use crate::io::config::{BootstrapConfig, DEFAULT_PYTHON_VERSION};
use crate::io::discovery::{
    ENVIRONMENT_FILES, README_FILE, REQUIREMENTS_FILE, is_local_module, project_name,
    read_optional, read_source, source_files,
};
use crate::io::toolchain::{Interpreter, create_bare_env, create_env_from_file};

/// One action tagged with the phase it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub phase: Phase,
    #[serde(flatten)]
    pub action: InstallAction,
}

/// Ordered install obligations for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    /// Interpreter version used for a bare isolated environment.
    pub python_version: String,
    /// Isolation requested but the environment prefix already exists.
    pub environment_exists: bool,
    /// Actions in execution order.
    pub actions: Vec<PlannedAction>,
}

impl InstallPlan {
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &InstallAction> {
        self.actions
            .iter()
            .filter(move |planned| planned.phase == phase)
            .map(|planned| &planned.action)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Build the install plan for the project rooted at `root`.
///
/// Package installs are rendered for `interpreter`. Fails only on unreadable
/// manifests or an unsupported accelerator version.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn build_plan(
    root: &Path,
    cfg: &BootstrapConfig,
    interpreter: &Interpreter,
) -> Result<InstallPlan> {
    let accelerator_tag = match cfg.cuda.as_deref() {
        Some(requested) => Some(build_tag(requested)?),
        None => None,
    };

    let facts = match read_optional(&root.join(README_FILE))? {
        Some(content) => {
            debug!("reading install instructions from {README_FILE}");
            extract(&content, &project_name(root))
        }
        None => ReadmeFacts::default(),
    };
    let python_version = resolve_python_version(cfg, &facts);

    let mut actions = Vec::new();
    let mut push = |phase: Phase, action: InstallAction| {
        actions.push(PlannedAction { phase, action });
    };

    for block in facts.immediate() {
        push(
            Phase::ReadmeImmediate,
            InstallAction::new(
                block.chained(),
                cfg.env_retries,
                format!("Install dependencies from {README_FILE}"),
            ),
        );
    }

    let environment_exists = cfg.conda && root.join(&cfg.env_dir).exists();
    if cfg.conda && !environment_exists {
        for file in ENVIRONMENT_FILES {
            if root.join(file).is_file() {
                push(
                    Phase::Environment,
                    InstallAction::new(
                        create_env_from_file(file, &cfg.env_dir),
                        cfg.env_retries,
                        format!("Create environment from {file}"),
                    ),
                );
            }
        }
        push(
            Phase::Environment,
            InstallAction::new(
                create_bare_env(&cfg.env_dir, &python_version),
                cfg.env_retries,
                format!("Create environment with python {python_version}"),
            ),
        );
    }

    let deferred: Vec<String> = facts
        .deferred()
        .flat_map(|block| block.commands.iter())
        .map(|command| match pip_install_args(command) {
            Some(args) => interpreter.pip_install(args),
            None => command.clone(),
        })
        .collect();
    if !deferred.is_empty() {
        push(
            Phase::ReadmeDeferred,
            InstallAction::new(
                deferred.join(" && "),
                cfg.env_retries,
                format!("Install pip dependencies from {README_FILE}"),
            ),
        );
    }

    match read_optional(&root.join(REQUIREMENTS_FILE))? {
        Some(contents) => {
            let names = requirement_names(&contents);
            if let Some(tag) = accelerator_tag
                && needs_accelerator_build(&names)
            {
                let args = format!("{} --index-url {}", FRAMEWORK_PACKAGES.join(" "), index_url(tag));
                push(
                    Phase::Accelerator,
                    InstallAction::new(
                        interpreter.pip_install(&args),
                        cfg.env_retries,
                        format!("Install framework with {tag} support"),
                    ),
                );
            }
            push(
                Phase::Manifest,
                InstallAction::new(
                    interpreter.pip_install_manifest(REQUIREMENTS_FILE),
                    cfg.env_retries,
                    format!("Install requirements from {REQUIREMENTS_FILE}"),
                ),
            );
        }
        None => info!("no {REQUIREMENTS_FILE} found, skipping manifest install"),
    }

    for package in inferred_packages(root, &cfg.env_dir)? {
        push(
            Phase::Inferred,
            InstallAction::new(
                interpreter.pip_install(&package),
                cfg.dep_retries,
                format!("Install module {package}"),
            ),
        );
    }

    info!(
        actions = actions.len(),
        python_version = %python_version,
        "install plan built"
    );
    Ok(InstallPlan {
        python_version,
        environment_exists,
        actions,
    })
}

/// Configured version, else the README hint, else the default.
pub fn resolve_python_version(cfg: &BootstrapConfig, facts: &ReadmeFacts) -> String {
    cfg.python_version
        .clone()
        .or_else(|| facts.python_version.clone())
        .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string())
}

/// Packages inferred from the first import of every source file, de-duplicated
/// in discovery order. Stdlib and project-local modules are skipped.
pub fn inferred_packages(root: &Path, env_dir: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut packages = Vec::new();
    let files = source_files(root, env_dir).context("scan project sources")?;
    for path in files {
        let source = match read_source(&path) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %path.display(), err = %err, "skipping unreadable source");
                continue;
            }
        };
        let Some(module) = first_import(&source) else {
            continue;
        };
        let top = top_level(&module);
        if is_stdlib(top) || is_local_module(root, top) {
            debug!(module = %module, "import needs no install");
            continue;
        }
        let package = install_name(&module).to_string();
        if seen.insert(package.clone()) {
            packages.push(package);
        }
    }
    Ok(packages)
}
