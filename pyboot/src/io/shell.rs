//! Shell abstraction for every externally executed action.
//!
//! The [`Shell`] trait decouples install and run-probe orchestration from the
//! actual OS shell. Tests use scripted shells that return predetermined
//! outputs without spawning processes.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::classifier::wait_expired_phrase;
use crate::core::types::ShellOutput;
use crate::io::process::run_shell_with_timeout;

/// Parameters for one shell invocation.
#[derive(Debug, Clone)]
pub struct ShellRequest {
    /// Full command line, interpreted by the platform shell.
    pub command: String,
    /// Working directory for the shell process.
    pub workdir: PathBuf,
    /// Maximum time to wait before the process is killed.
    pub timeout: Duration,
    /// Truncate stdout/stderr beyond this many bytes each.
    pub output_limit_bytes: usize,
}

/// Abstraction over command execution backends.
pub trait Shell {
    /// Run the command to completion (or timeout). Only spawn/wait failures are errors;
    /// a non-zero exit is a normal [`ShellOutput`].
    fn run(&self, request: &ShellRequest) -> Result<ShellOutput>;
}

/// Shell that spawns real processes through `sh -c` / `cmd /C`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

impl Shell for SystemShell {
    #[instrument(skip_all, fields(timeout_secs = request.timeout.as_secs()))]
    fn run(&self, request: &ShellRequest) -> Result<ShellOutput> {
        let output = run_shell_with_timeout(
            &request.command,
            &request.workdir,
            request.timeout,
            request.output_limit_bytes,
        )
        .with_context(|| format!("run `{}`", request.command))?;

        let mut text = output.merged_text();
        if output.timed_out {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&wait_expired_phrase(request.timeout));
            text.push('\n');
        }
        debug!(exit_code = ?output.status.code(), timed_out = output.timed_out, "shell finished");

        Ok(ShellOutput {
            exit_code: if output.timed_out {
                None
            } else {
                output.status.code()
            },
            output: text,
            timed_out: output.timed_out,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request(command: &str, dir: &std::path::Path, timeout: Duration) -> ShellRequest {
        ShellRequest {
            command: command.to_string(),
            workdir: dir.to_path_buf(),
            timeout,
            output_limit_bytes: 10_000,
        }
    }

    #[test]
    fn reports_exit_code_and_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = SystemShell
            .run(&request("echo hi; exit 4", temp.path(), Duration::from_secs(10)))
            .expect("run");
        assert_eq!(output.exit_code, Some(4));
        assert_eq!(output.output, "hi\n");
        assert!(!output.timed_out);
    }

    #[test]
    fn timeout_appends_wait_expired_phrase() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = SystemShell
            .run(&request("exec sleep 5", temp.path(), Duration::from_secs(1)))
            .expect("run");
        assert!(output.timed_out);
        assert_eq!(output.exit_code, None);
        assert!(output.output.contains("timed out after 1 seconds"));
    }

    #[test]
    fn timed_out_compound_command_is_reported_promptly() {
        let temp = tempfile::tempdir().expect("tempdir");
        let started = std::time::Instant::now();
        let output = SystemShell
            .run(&request("sleep 8; echo done", temp.path(), Duration::from_secs(1)))
            .expect("run");
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(output.timed_out);
        assert!(output.output.contains("timed out after 1 seconds"));
    }
}
