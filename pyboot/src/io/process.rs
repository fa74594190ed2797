//! Helpers for running shell commands with timeouts and bounded output.

use std::io::Read;
use std::mem;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Stdout followed by stderr, lossily decoded, with truncation notices.
    pub fn merged_text(&self) -> String {
        let mut buf = String::from_utf8_lossy(&self.stdout).into_owned();
        if self.stdout_truncated > 0 {
            buf.push_str(&format!("\n[stdout truncated {} bytes]\n", self.stdout_truncated));
        }
        if !self.stderr.is_empty() && !buf.is_empty() && !buf.ends_with('\n') {
            buf.push('\n');
        }
        buf.push_str(&String::from_utf8_lossy(&self.stderr));
        if self.stderr_truncated > 0 {
            buf.push_str(&format!("\n[stderr truncated {} bytes]\n", self.stderr_truncated));
        }
        buf
    }
}

/// How long readers may keep draining after the shell exits. Descendants that
/// inherited the pipes can hold them open indefinitely; their readers are
/// detached once this passes.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Build a platform shell invocation for a command line.
pub fn shell_command(command_line: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }
}

/// Run a shell command line in `workdir` with a timeout, capturing stdout/stderr
/// without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_shell_with_timeout(
    command_line: &str,
    workdir: &Path,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let mut cmd = shell_command(command_line);
    cmd.current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(command = command_line, "spawning shell");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn shell");
            return Err(e).with_context(|| format!("spawn shell for `{command_line}`"));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let (done_tx, done_rx) = mpsc::channel();
    let stdout_capture = spawn_reader(stdout, output_limit_bytes, done_tx.clone());
    let stderr_capture = spawn_reader(stderr, output_limit_bytes, done_tx);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let deadline = Instant::now() + DRAIN_GRACE;
    let mut drained = 0;
    while drained < 2 {
        let left = deadline.saturating_duration_since(Instant::now());
        if done_rx.recv_timeout(left).is_err() {
            warn!("output pipes held open by descendant processes, detaching readers");
            break;
        }
        drained += 1;
    }

    let (stdout, stdout_truncated) = take_capture(&stdout_capture).context("collect stdout")?;
    let (stderr, stderr_truncated) = take_capture(&stderr_capture).context("collect stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

#[derive(Default)]
struct Capture {
    buf: Vec<u8>,
    truncated: usize,
}

type SharedCapture = Arc<Mutex<Capture>>;

/// Drain `reader` on its own thread into a shared buffer; signal `done` at EOF.
fn spawn_reader<R: Read + Send + 'static>(
    reader: R,
    limit: usize,
    done: Sender<()>,
) -> SharedCapture {
    let capture = SharedCapture::default();
    let sink = Arc::clone(&capture);
    thread::spawn(move || {
        if let Err(err) = read_stream_limited(reader, limit, &sink) {
            warn!(err = %err, "output reader failed");
        }
        let _ = done.send(());
    });
    capture
}

/// Whatever has arrived so far; a detached reader keeps discarding the rest.
fn take_capture(capture: &SharedCapture) -> Result<(Vec<u8>, usize)> {
    let mut guard = capture
        .lock()
        .map_err(|_| anyhow!("output buffer poisoned"))?;
    let buf = mem::take(&mut guard.buf);
    let truncated = guard.truncated;
    guard.truncated = 0;
    Ok((buf, truncated))
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize, sink: &Mutex<Capture>) -> Result<()> {
    let mut chunk = [0u8; 8192];
    let mut kept = 0usize;

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let mut capture = sink
            .lock()
            .map_err(|_| anyhow!("output buffer poisoned"))?;
        let remaining = limit.saturating_sub(kept);
        let keep = n.min(remaining);
        capture.buf.extend_from_slice(&chunk[..keep]);
        capture.truncated += n - keep;
        kept += keep;
    }

    Ok(())
}
