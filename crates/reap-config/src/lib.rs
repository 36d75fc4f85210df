//! Process Reaper configuration loading and validation.
//!
//! This crate provides:
//! - Typed parsing of the targets document (`targets.json`)
//! - The absent-vs-empty distinction for the `processes` member
//! - Path resolution (CLI → env → working dir → exe dir → XDG → system)

pub mod resolve;
pub mod targets;

pub use resolve::{resolve_targets_path, ConfigSource, ResolvedTargets};
pub use targets::{load_targets, load_targets_file, parse_targets, ConfigError, TargetsFile};

/// Default targets file name.
pub const TARGETS_FILENAME: &str = "targets.json";

/// Environment variable overriding the targets file path.
pub const ENV_TARGETS_PATH: &str = "REAP_TARGETS";
