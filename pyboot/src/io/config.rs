//! Bootstrap configuration loaded from `pyboot.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::budget::RetryBudget;
use crate::error::BootstrapError;

pub const CONFIG_FILE_NAME: &str = "pyboot.toml";
pub const DEFAULT_PYTHON_VERSION: &str = "3.12";

/// Bootstrap configuration (TOML).
///
/// Every field is optional in the file. Command-line flags override file
/// values via [`Overrides::apply`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Interpreter version for a fresh isolated environment. When unset, a
    /// README hint is used before falling back to [`DEFAULT_PYTHON_VERSION`].
    pub python_version: Option<String>,

    /// Retry budget for environment creation and manifest installs.
    pub env_retries: RetryBudget,

    /// Retry budget for ad-hoc dependency installs and run attempts.
    pub dep_retries: RetryBudget,

    /// Per-attempt wall-clock budget for running the entry point, in seconds.
    pub wait_secs: u64,

    /// Create and use an isolated conda environment.
    pub conda: bool,

    /// Requested CUDA version for framework accelerator builds.
    pub cuda: Option<String>,

    /// Per-attempt wall-clock budget for install actions, in seconds.
    pub install_timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes each.
    pub output_limit_bytes: usize,

    /// Interpreter used when no isolated environment is requested.
    pub python_command: String,

    /// Prefix directory of the isolated environment, relative to the project.
    pub env_dir: String,

    /// On-demand installs allowed per package before the run-probe stops.
    pub max_heals_per_module: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            python_version: None,
            env_retries: RetryBudget::limited(10),
            dep_retries: RetryBudget::UNBOUNDED,
            wait_secs: 300,
            conda: false,
            cuda: None,
            install_timeout_secs: 30 * 60,
            output_limit_bytes: 1_000_000,
            python_command: "python".to_string(),
            env_dir: "venv".to_string(),
            max_heals_per_module: 3,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<(), BootstrapError> {
        let invalid = |msg: &str| Err(BootstrapError::InvalidConfig(msg.to_string()));
        if self.env_retries.get() < -1 {
            return invalid("env_retries must be >= -1");
        }
        if self.dep_retries.get() < -1 {
            return invalid("dep_retries must be >= -1");
        }
        if self.wait_secs == 0 {
            return invalid("wait_secs must be > 0");
        }
        if self.install_timeout_secs == 0 {
            return invalid("install_timeout_secs must be > 0");
        }
        if self.output_limit_bytes == 0 {
            return invalid("output_limit_bytes must be > 0");
        }
        if self.max_heals_per_module == 0 {
            return invalid("max_heals_per_module must be > 0");
        }
        if self.python_command.trim().is_empty() {
            return invalid("python_command must not be empty");
        }
        if self.env_dir.trim().is_empty() {
            return invalid("env_dir must not be empty");
        }
        if self
            .python_version
            .as_deref()
            .is_some_and(|v| v.trim().is_empty())
        {
            return invalid("python_version must not be empty");
        }
        Ok(())
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}

/// Values supplied on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub conda: bool,
    pub python_version: Option<String>,
    pub env_retries: Option<i32>,
    pub dep_retries: Option<i32>,
    pub cuda: Option<String>,
    pub wait_secs: Option<u64>,
}

impl Overrides {
    /// Apply overrides to `base` and re-validate.
    pub fn apply(&self, mut base: BootstrapConfig) -> Result<BootstrapConfig> {
        if self.conda {
            base.conda = true;
        }
        if let Some(version) = &self.python_version {
            base.python_version = Some(version.clone());
        }
        if let Some(max) = self.env_retries {
            base.env_retries = RetryBudget::new(max).context("--retlenv")?;
        }
        if let Some(max) = self.dep_retries {
            base.dep_retries = RetryBudget::new(max).context("--retry")?;
        }
        if let Some(cuda) = &self.cuda {
            base.cuda = Some(cuda.clone());
        }
        if let Some(wait) = self.wait_secs {
            base.wait_secs = wait;
        }
        base.validate()?;
        Ok(base)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BootstrapConfig::default()`.
pub fn load_config(path: &Path) -> Result<BootstrapConfig> {
    if !path.exists() {
        let cfg = BootstrapConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BootstrapConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
