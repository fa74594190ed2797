//! Shared deterministic types for bootstrap core logic.
//!
//! These types define stable contracts between the scanner, the retrying
//! runner, the run-probe and the orchestrator. They carry no I/O.

use std::fmt;

use serde::Serialize;

use crate::core::budget::RetryBudget;

/// One externally executed shell action, retried per its own budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallAction {
    pub command: String,
    pub max_retries: RetryBudget,
    pub label: String,
}

impl InstallAction {
    pub fn new(
        command: impl Into<String>,
        max_retries: RetryBudget,
        label: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            max_retries,
            label: label.into(),
        }
    }
}

/// What a shell invocation left behind, as seen by the classifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    /// `None` when the process was killed (e.g. on timeout).
    pub exit_code: Option<i32>,
    /// Captured stdout followed by stderr.
    pub output: String,
    pub timed_out: bool,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Classification of a single install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// Non-timeout failure; carries the retry counter after this attempt.
    Failure { retries: u32 },
    /// Reported, but never charged against the retry budget.
    Timeout,
}

/// Classification of a single run-probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunVerdict {
    /// Entry exited with status 0.
    Succeeded,
    /// Entry was still running when the wait budget expired.
    Survived,
    /// Entry failed on an import; carries the missing module path.
    MissingModule(String),
    /// Output mentions a timeout but not the wait-expiry phrase. Charged
    /// like `Failed`; kept apart so the final report names the cause.
    Timeout,
    Failed,
}

impl RunVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, RunVerdict::Succeeded | RunVerdict::Survived)
    }
}

/// Aggregate result of running one [`InstallAction`] to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub label: String,
    pub succeeded: bool,
    /// One entry per attempt, in order.
    pub outcomes: Vec<AttemptOutcome>,
}

impl InstallReport {
    pub fn attempts(&self) -> usize {
        self.outcomes.len()
    }

    /// Failed attempts charged against the budget (timeouts excluded).
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AttemptOutcome::Failure { .. }))
            .count()
    }

    pub fn timeouts(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AttemptOutcome::Timeout))
            .count()
    }
}

/// Which phase of the plan an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ReadmeImmediate,
    /// Alternatives: the first success wins.
    Environment,
    ReadmeDeferred,
    Accelerator,
    Manifest,
    Inferred,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ReadmeImmediate => "readme",
            Phase::Environment => "environment",
            Phase::ReadmeDeferred => "readme-deferred",
            Phase::Accelerator => "accelerator",
            Phase::Manifest => "manifest",
            Phase::Inferred => "inferred",
        };
        f.write_str(name)
    }
}
