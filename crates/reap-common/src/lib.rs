//! Process Reaper shared types.
//!
//! This crate holds the small vocabulary shared by the config loader and the
//! core engine:
//! - `Pid` and `ProcessRecord` (one row of the process table)
//! - `TargetList` (the ordered, validated kill list)
//! - `OutputFormat` (CLI output selection)

pub mod output;
pub mod types;

pub use output::OutputFormat;
pub use types::{Pid, ProcessRecord, TargetList};
