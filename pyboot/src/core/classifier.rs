//! Deterministic classification of shell attempts.
//!
//! Control decisions are made by sniffing process output, which is fragile by
//! nature. Every phrase the orchestrator relies on lives here, behind
//! [`OutcomeClassifier`], so the rules can be hardened without touching the
//! runner or the run-probe.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::core::types::{RunVerdict, ShellOutput};

/// Phrases that mark an attempt as a timeout rather than a failure.
pub const TIMEOUT_PHRASES: &[&str] = &["Timeout", "timeout", "timed out"];

static MODULE_NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ModuleNotFoundError: No module named\s*['"]([^'"]+)['"]"#).unwrap()
});

/// Install-attempt classification before retry accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallVerdict {
    Success,
    Timeout,
    Failure,
}

/// Maps raw shell output onto the outcomes the orchestrator acts on.
pub trait OutcomeClassifier {
    fn classify_install(&self, output: &ShellOutput) -> InstallVerdict;
    fn classify_run(&self, output: &ShellOutput, wait: Duration) -> RunVerdict;
}

/// Default phrase-matching rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseClassifier;

impl OutcomeClassifier for PhraseClassifier {
    fn classify_install(&self, output: &ShellOutput) -> InstallVerdict {
        if output.success() {
            InstallVerdict::Success
        } else if output.timed_out || mentions_timeout(&output.output) {
            InstallVerdict::Timeout
        } else {
            InstallVerdict::Failure
        }
    }

    fn classify_run(&self, output: &ShellOutput, wait: Duration) -> RunVerdict {
        if output.success() {
            return RunVerdict::Succeeded;
        }
        if output.output.contains(&wait_expired_phrase(wait)) {
            return RunVerdict::Survived;
        }
        if let Some(module) = missing_module(&output.output) {
            return RunVerdict::MissingModule(module);
        }
        if mentions_timeout(&output.output) {
            return RunVerdict::Timeout;
        }
        RunVerdict::Failed
    }
}

/// The phrase attached to output when a run outlives its wait budget.
pub fn wait_expired_phrase(wait: Duration) -> String {
    format!("timed out after {} seconds", wait.as_secs())
}

/// Each phrase is checked for membership on its own.
pub fn mentions_timeout(output: &str) -> bool {
    TIMEOUT_PHRASES.iter().any(|phrase| output.contains(phrase))
}

/// Module named by the last `ModuleNotFoundError` in `output`.
pub fn missing_module(output: &str) -> Option<String> {
    let captures = MODULE_NOT_FOUND.captures_iter(output).last()?;
    let module = captures.get(1)?.as_str().trim();
    if module.is_empty() {
        None
    } else {
        Some(module.to_string())
    }
}
