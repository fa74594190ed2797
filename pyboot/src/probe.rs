//! The run-probe: execute the entry, diagnose, heal, rerun.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::aliases::install_name;
use crate::core::budget::RetryBudget;
use crate::core::classifier::OutcomeClassifier;
use crate::core::types::{InstallAction, RunVerdict};
use crate::install::{ExecSettings, Installer};
use crate::io::shell::Shell;
use crate::io::toolchain::Interpreter;

/// How the probe runs and heals.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Wall-clock budget per run attempt.
    pub wait: Duration,
    /// Charged run failures allowed after the first.
    pub run_budget: RetryBudget,
    /// Retry budget for each heal install.
    pub heal_budget: RetryBudget,
    /// Heal installs allowed per package before the probe gives up.
    pub heal_limit: u32,
}

/// Outcome of the whole probe loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Verdict of the last attempt.
    pub verdict: RunVerdict,
    pub attempts: u32,
    /// Run failures charged against the budget. Heals never count.
    pub retries: u32,
    /// Packages installed on demand, in order.
    pub healed: Vec<String>,
    /// Heal installs attempted, successful or not.
    pub heal_attempts: u32,
}

impl ProbeReport {
    pub fn succeeded(&self) -> bool {
        self.verdict.is_success()
    }
}

pub struct RunProbe<'a, S: Shell, C: OutcomeClassifier> {
    shell: &'a S,
    classifier: &'a C,
    exec: &'a ExecSettings,
    interpreter: &'a Interpreter,
    settings: &'a ProbeSettings,
}

impl<'a, S: Shell, C: OutcomeClassifier> RunProbe<'a, S, C> {
    pub fn new(
        shell: &'a S,
        classifier: &'a C,
        exec: &'a ExecSettings,
        interpreter: &'a Interpreter,
        settings: &'a ProbeSettings,
    ) -> Self {
        Self {
            shell,
            classifier,
            exec,
            interpreter,
            settings,
        }
    }

    /// Run `entry` until it succeeds or the run budget is spent.
    ///
    /// A missing module triggers one heal install and a rerun, whatever the
    /// install outcome, without charging the run budget. A package reported
    /// missing more than `heal_limit` times stops the probe.
    #[instrument(skip_all, fields(entry = %entry, budget = %self.settings.run_budget))]
    pub fn run(&self, entry: &str) -> Result<ProbeReport> {
        let command = self.interpreter.run_script(entry);
        let request = self.exec.request(&command, self.settings.wait);
        let mut attempts = 0u32;
        let mut retries = 0u32;
        let mut healed: Vec<String> = Vec::new();
        let mut heals: HashMap<String, u32> = HashMap::new();
        let mut heal_attempts = 0u32;

        loop {
            attempts += 1;
            println!("Run {entry} (attempt {attempts})");
            let output = self.shell.run(&request)?;
            let verdict = self.classifier.classify_run(&output, self.settings.wait);
            debug!(?verdict, attempt = attempts, "run classified");

            if verdict.is_success() {
                if verdict == RunVerdict::Survived {
                    println!(
                        "{entry} still running after {} seconds, treating as success",
                        self.settings.wait.as_secs()
                    );
                }
                info!(attempts, "entry started cleanly");
                return Ok(ProbeReport {
                    verdict,
                    attempts,
                    retries,
                    healed,
                    heal_attempts,
                });
            }

            if let RunVerdict::MissingModule(module) = &verdict {
                let package = install_name(module).to_string();
                let count = heals.entry(package.clone()).or_default();
                if *count >= self.settings.heal_limit {
                    println!("Module {module} is still missing after {count} installs of {package}");
                    warn!(package = %package, heals = *count, "heal limit reached");
                    return Ok(ProbeReport {
                        verdict,
                        attempts,
                        retries,
                        healed,
                        heal_attempts,
                    });
                }
                *count += 1;
                heal_attempts += 1;
                println!("Module {module} is missing, installing {package}");
                if self.heal(&package)? {
                    if !healed.contains(&package) {
                        healed.push(package);
                    }
                } else {
                    warn!(package = %package, "heal install failed, rerunning anyway");
                }
                continue;
            }

            retries += 1;
            if !self.settings.run_budget.permits_retry(retries) {
                warn!(attempts, retries, "run budget exhausted");
                return Ok(ProbeReport {
                    verdict,
                    attempts,
                    retries,
                    healed,
                    heal_attempts,
                });
            }
            println!(
                "Run {entry} failed, retrying {retries}/{} ...",
                self.settings.run_budget
            );
        }
    }

    fn heal(&self, package: &str) -> Result<bool> {
        let action = InstallAction::new(
            self.interpreter.pip_install(package),
            self.settings.heal_budget,
            format!("Install module {package}"),
        );
        let report = Installer::new(self.shell, self.classifier, self.exec).run(&action)?;
        Ok(report.succeeded)
    }
}
