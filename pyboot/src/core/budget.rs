//! Retry budget shared by install actions and the run-probe.

use std::fmt;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Maximum number of retries after the first attempt. `-1` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryBudget(i32);

impl RetryBudget {
    pub const UNBOUNDED: RetryBudget = RetryBudget(-1);

    pub fn new(max: i32) -> Result<Self> {
        if max < -1 {
            return Err(anyhow!("retry budget must be >= -1, got {max}"));
        }
        Ok(Self(max))
    }

    pub fn limited(max: u32) -> Self {
        Self(i32::try_from(max).unwrap_or(i32::MAX))
    }

    pub fn is_unbounded(self) -> bool {
        self.0 == -1
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// True if another attempt may follow after `failures` charged failures.
    ///
    /// A budget of `N` permits the first attempt plus `N` retries.
    pub fn permits_retry(self, failures: u32) -> bool {
        if self.is_unbounded() {
            return true;
        }
        i64::from(failures) <= i64::from(self.0)
    }
}

impl fmt::Display for RetryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            f.write_str("unbounded")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
