//! Child processes with a hard deadline.

use crate::error::ConversionError;
use log::{debug, warn};
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_LIMIT: usize = 4096;

/// Owns a running child and kills its whole process tree on drop unless it already
/// exited.
///
/// Every early return of [`run_with_timeout`] goes through this drop, so an office
/// process never outlives the attempt that started it. Office hosts spawn their own
/// helpers (`soffice.bin`, the COM server behind `powershell`), so killing only the
/// direct child is not enough: on Unix the child leads its own process group and the
/// group is killed; on Windows `taskkill /T` takes the tree down.
pub struct ChildGuard {
    child: Option<Child>,
    program: String,
}

impl ChildGuard {
    pub fn spawn(cmd: &mut Command) -> Result<Self, ConversionError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                ConversionError::Unavailable(format!("{program}: {e}"))
            }
            _ => ConversionError::Io(e),
        })?;
        debug!("Started '{}' (pid {})", program, child.id());
        Ok(Self {
            child: Some(child),
            program,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn child_mut(&mut self) -> Result<&mut Child, ConversionError> {
        self.child
            .as_mut()
            .ok_or_else(|| ConversionError::Unavailable(self.program.clone()))
    }

    /// Waits until the child exits or `timeout` elapses. On timeout the child is killed
    /// and reaped before returning.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<ExitStatus, ConversionError> {
        let start = Instant::now();
        loop {
            if start.elapsed() > timeout {
                self.kill();
                return Err(ConversionError::Timeout {
                    program: self.program.clone(),
                    secs: timeout.as_secs(),
                });
            }
            match self.child_mut()?.try_wait()? {
                Some(status) => {
                    self.child = None;
                    return Ok(status);
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                warn!("Killing '{}' (pid {}) and its children", self.program, child.id());
                kill_tree(child.id());
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Kills the process group led by `pid`.
#[cfg(unix)]
fn kill_tree(pid: u32) {
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        warn!("Could not kill process group {}: {}", pid, e);
    }
}

/// Kills `pid` and every process it started.
#[cfg(windows)]
fn kill_tree(pid: u32) {
    let status = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        warn!("Could not kill process tree {}: {}", pid, e);
    }
}

#[cfg(not(any(unix, windows)))]
fn kill_tree(_pid: u32) {}

/// Result of a process that exited on its own.
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    /// First few KB of stderr, for logging.
    pub stderr: String,
}

impl Finished {
    /// Maps a non-zero exit into [`ConversionError::ProcessFailed`].
    pub fn success_or(self, program: &str) -> Result<Self, ConversionError> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(ConversionError::ProcessFailed {
                program: program.to_string(),
                status: format!("{} {}", self.status, self.stderr.trim()),
            })
        }
    }
}

/// Runs `cmd` with stdout discarded and stderr captured, killing it after `timeout`.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Finished, ConversionError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    let mut guard = ChildGuard::spawn(&mut cmd)?;

    let stderr_reader = guard
        .child_mut()?
        .stderr
        .take()
        .map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

    let status = guard.wait_timeout(timeout)?;
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| {
            let end = bytes.len().min(STDERR_LIMIT);
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        })
        .unwrap_or_default();

    Ok(Finished { status, stderr })
}
