//! Retrying command runner for install actions.
//!
//! An action runs until it succeeds or its retry budget is spent. Timeouts
//! are reported but never charged against the budget.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::classifier::{InstallVerdict, OutcomeClassifier};
use crate::core::types::{AttemptOutcome, InstallAction, InstallReport};
use crate::io::shell::{Shell, ShellRequest};

/// Where and how long actions may run.
#[derive(Debug, Clone)]
pub struct ExecSettings {
    pub workdir: PathBuf,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl ExecSettings {
    pub fn request(&self, command: &str, timeout: Duration) -> ShellRequest {
        ShellRequest {
            command: command.to_string(),
            workdir: self.workdir.clone(),
            timeout,
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

/// Runs [`InstallAction`]s through a [`Shell`], retrying per each action's budget.
pub struct Installer<'a, S: Shell, C: OutcomeClassifier> {
    shell: &'a S,
    classifier: &'a C,
    settings: &'a ExecSettings,
}

impl<'a, S: Shell, C: OutcomeClassifier> Installer<'a, S, C> {
    pub fn new(shell: &'a S, classifier: &'a C, settings: &'a ExecSettings) -> Self {
        Self {
            shell,
            classifier,
            settings,
        }
    }

    /// Run `action` until success or until its budget is exhausted.
    ///
    /// Only failures to spawn the shell are errors; a command that never
    /// succeeds yields a report with `succeeded == false`.
    #[instrument(skip_all, fields(label = %action.label, max_retries = %action.max_retries))]
    pub fn run(&self, action: &InstallAction) -> Result<InstallReport> {
        let request = self.settings.request(&action.command, self.settings.timeout);
        let mut outcomes = Vec::new();
        let mut failures = 0u32;

        loop {
            debug!(command = %action.command, attempt = outcomes.len() + 1, "running action");
            let output = self.shell.run(&request)?;
            match self.classifier.classify_install(&output) {
                InstallVerdict::Success => {
                    outcomes.push(AttemptOutcome::Success);
                    println!("{} succeeded", action.label);
                    info!(attempts = outcomes.len(), "action succeeded");
                    return Ok(InstallReport {
                        label: action.label.clone(),
                        succeeded: true,
                        outcomes,
                    });
                }
                InstallVerdict::Timeout => {
                    outcomes.push(AttemptOutcome::Timeout);
                    println!("{} timed out, retrying ...", action.label);
                    warn!(attempt = outcomes.len(), "action timed out");
                }
                InstallVerdict::Failure => {
                    failures += 1;
                    outcomes.push(AttemptOutcome::Failure { retries: failures });
                    if !action.max_retries.permits_retry(failures) {
                        break;
                    }
                    println!(
                        "{} failed, retrying {}/{} ...",
                        action.label, failures, action.max_retries
                    );
                }
            }
        }

        println!(
            "{} failed after {} retries",
            action.label,
            failures.saturating_sub(1)
        );
        warn!(attempts = outcomes.len(), "action exhausted its retry budget");
        Ok(InstallReport {
            label: action.label.clone(),
            succeeded: false,
            outcomes,
        })
    }
}
