//! Test-only helpers: scripted shells and scratch projects.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::types::ShellOutput;
use crate::io::shell::{Shell, ShellRequest};

/// Exit 0 with no output.
pub fn ok() -> ShellOutput {
    exit(0, "")
}

/// Exit 1 with `output`.
pub fn fail(output: &str) -> ShellOutput {
    exit(1, output)
}

pub fn exit(code: i32, output: &str) -> ShellOutput {
    ShellOutput {
        exit_code: Some(code),
        output: output.to_string(),
        timed_out: false,
    }
}

/// A process killed after `secs`, as [`crate::io::shell::SystemShell`] reports it.
pub fn killed_after(secs: u64) -> ShellOutput {
    ShellOutput {
        exit_code: None,
        output: format!("timed out after {secs} seconds\n"),
        timed_out: true,
    }
}

struct ScriptedRule {
    pattern: String,
    responses: VecDeque<ShellOutput>,
}

/// Shell that answers from canned outputs instead of spawning processes.
///
/// Each rule matches commands containing its pattern and pops its responses
/// in order; the last response repeats. Unmatched commands succeed.
#[derive(Default)]
pub struct ScriptedShell {
    rules: RefCell<Vec<ScriptedRule>>,
    calls: RefCell<Vec<ShellRequest>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` with `responses`, in order.
    pub fn on(self, pattern: &str, responses: Vec<ShellOutput>) -> Self {
        self.rules.borrow_mut().push(ScriptedRule {
            pattern: pattern.to_string(),
            responses: responses.into(),
        });
        self
    }

    /// Every command line run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|req| req.command.clone())
            .collect()
    }

    /// Every request run so far, in order.
    pub fn requests(&self) -> Vec<ShellRequest> {
        self.calls.borrow().clone()
    }

    /// Number of commands containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|req| req.command.contains(pattern))
            .count()
    }

    /// Position of the first command containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.calls
            .borrow()
            .iter()
            .position(|req| req.command.contains(pattern))
    }
}

impl Shell for ScriptedShell {
    fn run(&self, request: &ShellRequest) -> Result<ShellOutput> {
        self.calls.borrow_mut().push(request.clone());
        let mut rules = self.rules.borrow_mut();
        let Some(rule) = rules
            .iter_mut()
            .find(|rule| request.command.contains(&rule.pattern))
        else {
            return Ok(ok());
        };
        let response = if rule.responses.len() > 1 {
            rule.responses.pop_front()
        } else {
            rule.responses.front().cloned()
        };
        Ok(response.unwrap_or_else(ok))
    }
}

/// Scratch project directory removed on drop.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("project-")
            .tempdir()
            .context("create temp project")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn mkdir(&self, rel: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(&path).with_context(|| format!("create {}", path.display()))?;
        Ok(path)
    }
}
