//! External tool invocation behind a mockable runner.

use crate::error::{ActivationError, Result};
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Minimum time allowed for reading output left in the pipes after exit.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Exit status and captured streams of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Capability to locate and run external executables.
pub trait CommandRunner {
    /// Resolve `program` on the execution path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run `program` to completion, capturing stdout/stderr.
    ///
    /// A non-zero exit is *not* an error here; only failure to start or a
    /// timeout is.
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput>;
}

/// Run a tool and turn a non-zero exit into [`ActivationError::ToolExecution`].
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[OsString],
) -> Result<ToolOutput> {
    let output = runner.run(program, args)?;
    if output.success() {
        return Ok(output);
    }
    let reason = match output.status {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    };
    Err(ActivationError::ToolExecution {
        tool: program.to_string(),
        reason,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Spawns real processes, killing any that outlive `timeout`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput> {
        tracing::debug!(tool = program, ?args, "running external tool");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ActivationError::ToolExecution {
                tool: program.to_string(),
                reason: format!("could not be started: {}", e),
                stdout: String::new(),
                stderr: String::new(),
            })?;

        let deadline = Instant::now() + self.timeout;
        let stdout = capture(child.stdout.take());
        let stderr = capture(child.stderr.take());

        let status = wait_with_deadline(&mut child, deadline, self.timeout).map_err(|reason| {
            // readers may block on grandchildren holding the pipes; leave them
            ActivationError::ToolExecution {
                tool: program.to_string(),
                reason,
                stdout: String::new(),
                stderr: String::new(),
            }
        })?;

        // a background process can keep the pipes open past exit
        let drain_until = deadline.max(Instant::now() + DRAIN_GRACE);
        Ok(ToolOutput {
            status: status.code(),
            stdout: collect(stdout, drain_until),
            stderr: collect(stderr, drain_until),
        })
    }
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
) -> std::result::Result<ExitStatus, String> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {}s", timeout.as_secs_f32()));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(format!("wait failed: {}", e));
            }
        }
    }
}

/// Read `pipe` on a detached thread, forwarding chunks as they arrive.
fn capture<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 8192];
            loop {
                match pipe.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });
        rx
    })
}

/// Gather output until the writer side closes or `until` passes.
fn collect(rx: Option<Receiver<Vec<u8>>>, until: Instant) -> String {
    let mut out = Vec::new();
    if let Some(rx) = rx {
        while let Ok(chunk) = rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
            out.extend_from_slice(&chunk);
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
