//! Test doubles for the engine's injected capabilities.
//!
//! Provides a fixed-table process source, a recording terminator with
//! scriptable per-pid failures, and a recording logger. Exported behind the
//! `test-utils` feature so integration suites can drive the engine without
//! touching the live process table.

use crate::action::{TerminateError, Terminator};
use crate::collect::{CollectError, ProcessSource};
use crate::engine::ReapLogger;
use reap_common::ProcessRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Process source returning an injected fixed table.
#[derive(Debug, Default)]
pub struct MockProcessSource {
    records: Vec<ProcessRecord>,
    fail_message: Option<String>,
    snapshots: AtomicUsize,
}

impl MockProcessSource {
    /// Source yielding `records` on every snapshot.
    pub fn with_records(records: Vec<ProcessRecord>) -> Self {
        Self {
            records,
            fail_message: None,
            snapshots: AtomicUsize::new(0),
        }
    }

    /// Convenience: build a table from `(name, pid)` pairs.
    pub fn with_table(table: &[(&str, u32)]) -> Self {
        Self::with_records(
            table
                .iter()
                .map(|(name, pid)| ProcessRecord::new(*name, *pid))
                .collect(),
        )
    }

    /// Source whose every snapshot fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            records: Vec::new(),
            fail_message: Some(message.to_string()),
            snapshots: AtomicUsize::new(0),
        }
    }

    /// Number of snapshot calls taken so far.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl ProcessSource for MockProcessSource {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CollectError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        match &self.fail_message {
            Some(message) => Err(CollectError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                message.clone(),
            ))),
            None => Ok(self.records.clone()),
        }
    }
}

/// One recorded terminate call.
#[derive(Debug, Clone)]
pub struct TerminateCall {
    pub record: ProcessRecord,
    pub kill_tree: bool,
}

/// Terminator that records every call and fails the pids it is told to.
#[derive(Debug, Default)]
pub struct MockTerminator {
    calls: Mutex<Vec<TerminateCall>>,
    failures: Mutex<HashMap<u32, String>>,
}

impl MockTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a failure for `pid` with the given cause text.
    pub fn fail_pid(&self, pid: u32, cause: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(pid, cause.to_string());
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<TerminateCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Terminator for MockTerminator {
    fn terminate(&self, record: &ProcessRecord, kill_tree: bool) -> Result<(), TerminateError> {
        self.calls.lock().unwrap().push(TerminateCall {
            record: record.clone(),
            kill_tree,
        });
        match self.failures.lock().unwrap().get(&record.pid.0) {
            Some(cause) => Err(TerminateError::Failed(cause.clone())),
            None => Ok(()),
        }
    }
}

/// Logger that records messages per severity for assertion.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    infos: Mutex<Vec<String>>,
    debugs: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn debugs(&self) -> Vec<String> {
        self.debugs.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl ReapLogger for MemoryLogger {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn debug(&self, message: &str) {
        self.debugs.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_source_counts_snapshots() {
        let source = MockProcessSource::with_table(&[("a", 1)]);
        assert_eq!(source.snapshot_count(), 0);
        source.snapshot().unwrap();
        source.snapshot().unwrap();
        assert_eq!(source.snapshot_count(), 2);
    }

    #[test]
    fn mock_terminator_scripts_failures() {
        let terminator = MockTerminator::new();
        terminator.fail_pid(7, "busy");

        let ok = terminator.terminate(&ProcessRecord::new("a", 1), false);
        let err = terminator.terminate(&ProcessRecord::new("b", 7), false);

        assert!(ok.is_ok());
        assert!(err.unwrap_err().to_string().contains("busy"));
        assert_eq!(terminator.calls().len(), 2);
    }

    #[test]
    fn memory_logger_records_by_severity() {
        let log = MemoryLogger::new();
        log.info("i");
        log.debug("d");
        log.warn("w");
        assert_eq!(log.infos(), vec!["i"]);
        assert_eq!(log.debugs(), vec!["d"]);
        assert_eq!(log.warnings(), vec!["w"]);
    }
}
