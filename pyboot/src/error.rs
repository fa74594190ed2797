//! Fatal bootstrap errors.
//!
//! Soft failures (an install that never succeeds, a run that crashes) are not
//! errors; they are recorded as outcomes and only surface as
//! [`BootstrapError::RetryBudgetExhausted`] once the run-probe gives up.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("entry point {entry} not found (tried {entry}, {entry}.py, {entry}.pyw)")]
    EntryNotFound { entry: String },

    /// The entry-not-found case of auto-selection: no `.py` or `.pyw` file
    /// at the top level. Kept apart from [`BootstrapError::EntryNotFound`]
    /// because there is no entry name to report; same exit code.
    #[error("no python files found")]
    NoScripts,

    #[error(
        "multiple python files found ({}), please specify the entry point manually",
        candidates.join(", ")
    )]
    AmbiguousEntry { candidates: Vec<String> },

    #[error("cuda version {requested} is not supported (supported: {})", supported.join(", "))]
    UnsupportedAcceleratorVersion {
        requested: String,
        supported: Vec<String>,
    },

    #[error("environment setup of {entry} failed after {retries} retries")]
    RetryBudgetExhausted { entry: String, retries: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_entry_lists_candidates() {
        let err = BootstrapError::AmbiguousEntry {
            candidates: vec!["a.py".to_string(), "b.py".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "multiple python files found (a.py, b.py), please specify the entry point manually"
        );
    }

    #[test]
    fn unsupported_accelerator_lists_supported_versions() {
        let err = BootstrapError::UnsupportedAcceleratorVersion {
            requested: "10.2".to_string(),
            supported: vec!["11.8".to_string(), "12.1".to_string()],
        };
        assert!(err.to_string().contains("11.8, 12.1"));
    }
}
