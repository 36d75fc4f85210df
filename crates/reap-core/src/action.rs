//! Signal-based process termination.
//!
//! The terminate capability behind the engine. The real runner delivers
//! SIGKILL via `kill(2)` with errno mapped into a structured error; a
//! `kill_tree` request addresses the process group (negative pid) instead of
//! the single process. The engine only ever asks for single-process kills.

use reap_common::ProcessRecord;
use thiserror::Error;

/// Errors from a single terminate attempt.
///
/// Always recovered locally by the caller: one failed kill never aborts the
/// remaining attempts of a pass.
#[derive(Debug, Error)]
pub enum TerminateError {
    #[error("process not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("terminate failed: {0}")]
    Failed(String),
}

/// Capability contract: terminate one process.
///
/// `kill_tree = false` addresses exactly the matched process;
/// `kill_tree = true` would address its process group. Callers in this crate
/// always pass `false`.
pub trait Terminator: Send + Sync {
    fn terminate(&self, record: &ProcessRecord, kill_tree: bool) -> Result<(), TerminateError>;
}

/// The real signal-delivering terminator.
#[derive(Debug, Default)]
pub struct SignalTerminator;

impl SignalTerminator {
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn send_kill(&self, pid: u32, use_group: bool) -> Result<(), TerminateError> {
        let target_pid = if use_group {
            -(pid as i32) // Negative PID targets process group
        } else {
            pid as i32
        };

        let result = unsafe { libc::kill(target_pid, libc::SIGKILL) };
        if result == 0 {
            return Ok(());
        }

        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Err(TerminateError::NotFound),
            Some(libc::EPERM) => Err(TerminateError::PermissionDenied),
            Some(libc::EINVAL) => Err(TerminateError::Failed("invalid signal".to_string())),
            _ => Err(TerminateError::Failed(err.to_string())),
        }
    }
}

#[cfg(unix)]
impl Terminator for SignalTerminator {
    fn terminate(&self, record: &ProcessRecord, kill_tree: bool) -> Result<(), TerminateError> {
        self.send_kill(record.pid.0, kill_tree)
    }
}

#[cfg(not(unix))]
impl Terminator for SignalTerminator {
    fn terminate(&self, _record: &ProcessRecord, _kill_tree: bool) -> Result<(), TerminateError> {
        Err(TerminateError::Failed(
            "signals not supported on this platform".to_string(),
        ))
    }
}
