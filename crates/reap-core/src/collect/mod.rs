//! Process table collection.
//!
//! The enumeration capability behind the engine: one call yields a fresh
//! snapshot of the live process table (name + pid), never cached across
//! calls. Implementations:
//! - Linux: `/proc` walk reading `comm`
//! - Other Unix: single `ps` invocation
//! - Tests: injected fixed tables (see `mock_process`)

#[cfg(target_os = "linux")]
mod proc_scan;
#[cfg(all(unix, not(target_os = "linux")))]
mod ps_scan;

use reap_common::ProcessRecord;
use thiserror::Error;

/// Errors that can occur during process enumeration.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read process table: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to execute ps: {0}")]
    CommandFailed(String),

    #[error("failed to parse ps output: {message} at line {line_num}")]
    ParseError { message: String, line_num: usize },

    #[error("process enumeration not supported on this platform")]
    UnsupportedPlatform,
}

/// Capability contract: yield the live process table at the instant of the
/// call.
///
/// An empty system process table is an empty vector, never an error. Each
/// call produces a fresh, independent snapshot; no record outlives its batch.
pub trait ProcessSource: Send + Sync {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CollectError>;
}

/// The real process source backed by OS enumeration.
#[derive(Debug, Default)]
pub struct SystemProcessSource;

impl SystemProcessSource {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSource for SystemProcessSource {
    #[cfg(target_os = "linux")]
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CollectError> {
        proc_scan::snapshot()
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CollectError> {
        ps_scan::snapshot()
    }

    #[cfg(not(unix))]
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CollectError> {
        Err(CollectError::UnsupportedPlatform)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn snapshot_includes_current_process() {
        let source = SystemProcessSource::new();
        let table = source.snapshot().expect("snapshot");
        let own_pid = std::process::id();
        assert!(
            table.iter().any(|r| r.pid.0 == own_pid),
            "own pid {} missing from {} records",
            own_pid,
            table.len()
        );
    }

    #[test]
    fn snapshots_are_independent() {
        let source = SystemProcessSource::new();
        let first = source.snapshot().expect("first snapshot");
        let second = source.snapshot().expect("second snapshot");
        // Fresh enumeration per call; both see a populated table.
        assert!(!first.is_empty());
        assert!(!second.is_empty());
    }

    #[test]
    fn names_carry_no_trailing_newline() {
        // Kernel threads legitimately contain '/' (kworker/0:1); only the
        // comm trailing newline must be gone.
        let source = SystemProcessSource::new();
        let table = source.snapshot().expect("snapshot");
        for rec in &table {
            assert!(!rec.name.contains('\n'), "newline in {:?}", rec.name);
        }
    }
}
