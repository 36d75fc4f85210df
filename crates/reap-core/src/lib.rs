//! Process Reaper Core Library
//!
//! This library provides the core functionality for process reaping:
//! - Exit codes for CLI operations
//! - Targets configuration loading (via `reap-config`)
//! - Process table collection
//! - The targeting-and-termination engine
//! - The oneshot/daemon execution loop
//! - systemd service registration
//!
//! The binary entry point is in `main.rs`.

pub mod action;
pub mod collect;
pub mod daemon;
pub mod engine;
pub mod exit_codes;
pub mod logging;
pub mod service;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock_process;
