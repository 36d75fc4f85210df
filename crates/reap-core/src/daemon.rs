//! The execution loop wrapping the engine.
//!
//! One loop instance drives one run: load the target list once, then tick the
//! engine on a schedule until cancelled (daemon) or after a single tick
//! (oneshot). Configuration failure at start is fatal and surfaced to the
//! caller; tick failures in daemon mode are logged, absorbed by a short
//! recovery delay, and never kill the loop.
//!
//! Single logical worker: the only suspension point is the inter-tick wait,
//! which polls the cancel flag so a stop request is honored promptly instead
//! of after the full interval.

use crate::collect::CollectError;
use crate::engine::{ReapEngine, TickStats};
use chrono::Utc;
use reap_common::TargetList;
use reap_config::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that stop the loop from starting or, in oneshot mode, from
/// completing its single tick.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Malformed or missing target configuration. Operator error: fatal,
    /// never retried.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Non-positive schedule interval; the loop never begins.
    #[error("invalid interval: {seconds}s (must be positive)")]
    InvalidInterval { seconds: u64 },

    /// The single oneshot tick failed outright (daemon mode absorbs these).
    #[error("tick failed: {source}")]
    Tick {
        #[source]
        source: CollectError,
    },
}

/// Cancellation flag shared between the loop and its controller.
///
/// Cloned handles observe the same flag; a handler installed for
/// SIGINT/SIGTERM flips it and the loop winds down after the in-flight tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Bounded wait that honors cancellation.
    ///
    /// Sleeps in `poll`-sized slices up to `duration`. Returns `true` if the
    /// token was cancelled before the wait elapsed.
    pub fn wait(&self, duration: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep((deadline - now).min(poll));
        }
    }
}

/// Loop schedule configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Interval between ticks.
    pub interval: Duration,
    /// Wait after a failed tick, shorter than the normal interval.
    pub recovery_delay: Duration,
    /// Granularity of the cancellable wait.
    pub poll_interval: Duration,
    /// Execute exactly one tick, then stop.
    pub oneshot: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            recovery_delay: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            oneshot: false,
        }
    }
}

impl LoopConfig {
    /// Single-pass configuration.
    pub fn oneshot() -> Self {
        Self {
            oneshot: true,
            ..Self::default()
        }
    }

    /// Looping configuration with the given inter-tick interval.
    pub fn daemon(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }
}

/// Phase of the loop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Idle,
    Starting,
    Running,
    Executing,
    Waiting,
    Stopped,
}

/// Observable running state of the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopState {
    pub phase: LoopPhase,
    pub started_at: Option<String>,
    pub tick_count: u64,
    pub last_tick_at: Option<String>,
    pub error_count: u64,
}

impl LoopState {
    fn new() -> Self {
        Self {
            phase: LoopPhase::Idle,
            started_at: None,
            tick_count: 0,
            last_tick_at: None,
            error_count: 0,
        }
    }
}

/// Outcome of a completed loop run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopSummary {
    /// Ticks executed (failed ticks included).
    pub ticks: u64,
    /// Stats of the last successful tick.
    pub last_stats: Option<TickStats>,
    /// Whether the run ended due to cancellation.
    pub cancelled: bool,
}

/// The execution loop.
pub struct ExecutionLoop {
    config: LoopConfig,
    engine: ReapEngine,
    state: LoopState,
    cancel: CancelToken,
}

impl ExecutionLoop {
    pub fn new(config: LoopConfig, engine: ReapEngine) -> Self {
        Self {
            config,
            engine,
            state: LoopState::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Handle to the loop's cancellation flag.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Run the loop to completion.
    ///
    /// `load_targets` is invoked exactly once, in the `Starting` phase; the
    /// list it returns is threaded into every tick unchanged (a target-list
    /// change requires a restart). Its failure stops the loop before the
    /// first tick and surfaces as `DaemonError::Config`.
    pub fn run<L>(&mut self, load_targets: L) -> Result<LoopSummary, DaemonError>
    where
        L: FnOnce() -> Result<TargetList, ConfigError>,
    {
        if !self.config.oneshot && self.config.interval.is_zero() {
            return Err(DaemonError::InvalidInterval { seconds: 0 });
        }

        self.state.phase = LoopPhase::Starting;
        self.state.started_at = Some(Utc::now().to_rfc3339());

        let targets = match load_targets() {
            Ok(targets) => targets,
            Err(err) => {
                self.state.phase = LoopPhase::Stopped;
                return Err(err.into());
            }
        };
        info!(target_count = targets.len(), "execution loop started");

        self.state.phase = LoopPhase::Running;
        let mut summary = LoopSummary::default();

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            self.state.phase = LoopPhase::Executing;
            let mut tick_failed = false;
            match self.engine.run(&targets) {
                Ok(stats) => {
                    summary.last_stats = Some(stats);
                }
                Err(err) => {
                    tick_failed = true;
                    self.state.error_count += 1;
                    if self.config.oneshot {
                        self.state.phase = LoopPhase::Stopped;
                        return Err(DaemonError::Tick { source: err });
                    }
                    warn!("tick failed: {err}; continuing after recovery delay");
                }
            }
            self.state.tick_count += 1;
            self.state.last_tick_at = Some(Utc::now().to_rfc3339());
            summary.ticks += 1;

            if self.config.oneshot {
                break;
            }

            self.state.phase = LoopPhase::Waiting;
            let wait = if tick_failed {
                self.config.recovery_delay
            } else {
                self.config.interval
            };
            if self.cancel.wait(wait, self.config.poll_interval) {
                summary.cancelled = true;
                break;
            }
        }

        self.state.phase = LoopPhase::Stopped;
        info!(
            ticks = summary.ticks,
            cancelled = summary.cancelled,
            "execution loop stopped"
        );
        Ok(summary)
    }
}
