//! The targeting-and-termination engine.
//!
//! One `run` call is one pass: announce the targets, snapshot the process
//! table, select every record whose name exactly matches a target, and
//! terminate each match. Failures are per-process; a pass as a whole only
//! fails if the table itself cannot be read.
//!
//! All three collaborators (process source, terminator, logger) are injected
//! at construction so the engine is fully exercisable against test doubles.

use crate::action::Terminator;
use crate::collect::{CollectError, ProcessSource};
use reap_common::TargetList;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Three-severity logging capability consumed by the engine.
///
/// The production sink forwards to `tracing`; tests substitute a recording
/// sink and assert on the emitted lines.
pub trait ReapLogger: Send + Sync {
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Logger that forwards to the `tracing` macros.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl ReapLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Outcome counters for a single pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    /// Configured target names.
    pub targets: usize,
    /// Process records whose name matched a target.
    pub matched: usize,
    /// Matches terminated successfully.
    pub terminated: usize,
    /// Matches whose terminate call failed (logged, not fatal).
    pub failed: usize,
}

/// The termination engine.
pub struct ReapEngine {
    source: Arc<dyn ProcessSource>,
    terminator: Arc<dyn Terminator>,
    log: Arc<dyn ReapLogger>,
}

impl ReapEngine {
    pub fn new(
        source: Arc<dyn ProcessSource>,
        terminator: Arc<dyn Terminator>,
        log: Arc<dyn ReapLogger>,
    ) -> Self {
        Self {
            source,
            terminator,
            log,
        }
    }

    /// Engine wired to the real OS: /proc-or-ps enumeration, SIGKILL
    /// delivery, tracing output.
    pub fn with_system_defaults() -> Self {
        Self::new(
            Arc::new(crate::collect::SystemProcessSource::new()),
            Arc::new(crate::action::SignalTerminator::new()),
            Arc::new(TracingLogger),
        )
    }

    /// Execute one pass against `targets`.
    ///
    /// Never caches process state: every call takes a fresh snapshot. The
    /// completion line is emitted on both the empty and non-empty branches,
    /// so callers and tests can rely on it as a pass-finished signal. Only
    /// an enumeration failure escapes as `Err`; terminate failures are
    /// logged per process and the iteration continues.
    pub fn run(&self, targets: &TargetList) -> Result<TickStats, CollectError> {
        self.log.info("Reaping configured target processes.");
        self.log.info("Targets are:");
        for target in targets {
            self.log.info(target);
        }

        let mut stats = TickStats {
            targets: targets.len(),
            ..TickStats::default()
        };

        if targets.is_empty() {
            self.log.warn("No targets specified in configuration.");
            self.log.info("Reap pass complete.");
            return Ok(stats);
        }

        let table = self.source.snapshot()?;

        for record in table.iter().filter(|r| targets.contains(&r.name)) {
            stats.matched += 1;
            self.log.debug(&format!(
                "Attempting to terminate {} (pid {})",
                record.name, record.pid
            ));
            // Never the process subtree, only the exact matched process.
            match self.terminator.terminate(record, false) {
                Ok(()) => stats.terminated += 1,
                Err(err) => {
                    stats.failed += 1;
                    self.log.warn(&format!(
                        "Failed to terminate {} (pid {}): {}",
                        record.name, record.pid, err
                    ));
                }
            }
        }

        self.log.info("Reap pass complete.");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_process::{MemoryLogger, MockProcessSource, MockTerminator};
    use reap_common::ProcessRecord;

    fn engine_with(
        records: Vec<ProcessRecord>,
    ) -> (ReapEngine, Arc<MockTerminator>, Arc<MemoryLogger>) {
        let terminator = Arc::new(MockTerminator::new());
        let log = Arc::new(MemoryLogger::new());
        let engine = ReapEngine::new(
            Arc::new(MockProcessSource::with_records(records)),
            terminator.clone(),
            log.clone(),
        );
        (engine, terminator, log)
    }

    #[test]
    fn matches_exactly_one_of_two_processes() {
        let (engine, terminator, _log) = engine_with(vec![
            ProcessRecord::new("crashpad_handler", 100),
            ProcessRecord::new("other", 200),
        ]);

        let stats = engine
            .run(&TargetList::from(vec!["crashpad_handler"]))
            .unwrap();

        assert_eq!(stats.matched, 1);
        assert_eq!(stats.terminated, 1);
        let calls = terminator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].record.pid.0, 100);
    }

    #[test]
    fn duplicate_process_names_all_get_attempts() {
        let (engine, terminator, _log) = engine_with(vec![
            ProcessRecord::new("crashpad_handler", 100),
            ProcessRecord::new("crashpad_handler", 101),
            ProcessRecord::new("crashpad_handler", 102),
            ProcessRecord::new("other", 200),
        ]);

        let stats = engine
            .run(&TargetList::from(vec!["crashpad_handler"]))
            .unwrap();

        assert_eq!(stats.matched, 3);
        let pids: Vec<u32> = terminator.calls().iter().map(|c| c.record.pid.0).collect();
        assert_eq!(pids, vec![100, 101, 102]);
    }

    #[test]
    fn matching_is_case_sensitive_and_untrimmed() {
        let (engine, terminator, _log) = engine_with(vec![
            ProcessRecord::new("Crashpad_Handler", 100),
            ProcessRecord::new("crashpad_handler ", 101),
            ProcessRecord::new("crashpad_handler", 102),
        ]);

        engine
            .run(&TargetList::from(vec!["crashpad_handler"]))
            .unwrap();

        let calls = terminator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].record.pid.0, 102);
    }

    #[test]
    fn kill_tree_flag_is_false_on_every_call() {
        let (engine, terminator, _log) = engine_with(vec![
            ProcessRecord::new("a", 1),
            ProcessRecord::new("b", 2),
        ]);

        engine.run(&TargetList::from(vec!["a", "b"])).unwrap();

        let calls = terminator.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| !c.kill_tree));
    }

    #[test]
    fn one_failure_never_aborts_remaining_attempts() {
        let (engine, terminator, log) = engine_with(vec![
            ProcessRecord::new("target1", 100),
            ProcessRecord::new("target2", 200),
            ProcessRecord::new("target1", 300),
        ]);
        terminator.fail_pid(100, "access denied");

        let stats = engine
            .run(&TargetList::from(vec!["target1", "target2"]))
            .unwrap();

        assert_eq!(stats.matched, 3);
        assert_eq!(stats.terminated, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(terminator.calls().len(), 3);

        let warns = log.warnings();
        assert_eq!(warns.len(), 1);
        assert!(warns[0].contains("target1"));
        assert!(warns[0].contains("100"));
        assert!(warns[0].contains("access denied"));
        assert!(log.infos().last().unwrap().contains("complete"));
    }

    #[test]
    fn empty_target_list_warns_and_skips_enumeration() {
        let source = Arc::new(MockProcessSource::with_records(vec![ProcessRecord::new(
            "anything", 1,
        )]));
        let terminator = Arc::new(MockTerminator::new());
        let log = Arc::new(MemoryLogger::new());
        let engine = ReapEngine::new(source.clone(), terminator.clone(), log.clone());

        let stats = engine.run(&TargetList::default()).unwrap();

        assert_eq!(stats.matched, 0);
        assert!(terminator.calls().is_empty());
        assert_eq!(source.snapshot_count(), 0, "no enumeration for empty list");
        assert_eq!(
            log.warnings(),
            vec!["No targets specified in configuration.".to_string()]
        );
        assert!(log.infos().last().unwrap().contains("complete"));
    }

    #[test]
    fn announces_targets_in_order_before_matching() {
        let (engine, _terminator, log) = engine_with(vec![]);

        engine.run(&TargetList::from(vec!["b", "a"])).unwrap();

        let infos = log.infos();
        assert_eq!(infos[0], "Reaping configured target processes.");
        assert_eq!(infos[1], "Targets are:");
        assert_eq!(infos[2], "b");
        assert_eq!(infos[3], "a");
    }

    #[test]
    fn empty_process_table_is_a_clean_pass() {
        let (engine, terminator, log) = engine_with(vec![]);

        let stats = engine.run(&TargetList::from(vec!["ghost"])).unwrap();

        assert_eq!(stats.matched, 0);
        assert!(terminator.calls().is_empty());
        assert!(log.warnings().is_empty());
        assert!(log.infos().last().unwrap().contains("complete"));
    }

    #[test]
    fn snapshot_failure_escapes_without_completion_line() {
        let source = Arc::new(MockProcessSource::failing("proc table unreadable"));
        let log = Arc::new(MemoryLogger::new());
        let engine = ReapEngine::new(
            source,
            Arc::new(MockTerminator::new()),
            log.clone(),
        );

        let err = engine.run(&TargetList::from(vec!["x"])).unwrap_err();
        assert!(err.to_string().contains("proc table unreadable"));
        assert!(!log.infos().iter().any(|m| m.contains("complete")));
    }

    #[test]
    fn fresh_snapshot_every_pass() {
        let source = Arc::new(MockProcessSource::with_records(vec![ProcessRecord::new(
            "a", 1,
        )]));
        let engine = ReapEngine::new(
            source.clone(),
            Arc::new(MockTerminator::new()),
            Arc::new(MemoryLogger::new()),
        );
        let targets = TargetList::from(vec!["a"]);

        engine.run(&targets).unwrap();
        engine.run(&targets).unwrap();

        assert_eq!(source.snapshot_count(), 2);
    }
}
