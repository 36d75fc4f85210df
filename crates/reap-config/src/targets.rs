//! Targets document parsing.
//!
//! The targets document is a JSON object whose `processes` member is an array
//! of process names, in kill-list order:
//!
//! ```json
//! {"processes": ["crashpad_handler", "minidump_uploader"], "interval": 600}
//! ```
//!
//! Two shapes are deliberately distinguished:
//! - `processes` **absent** → `ConfigError::NoTargets` (operator error)
//! - `processes` present but empty → a valid empty list (a no-op run)
//!
//! Name values are taken exactly as they appear in the document: document
//! order, no trimming, no case-folding.

use reap_common::TargetList;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while locating, reading, or parsing the targets
/// document. All of them are fatal to the invocation that hit them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("targets file not found; attempted paths: {attempted}")]
    NotFound { attempted: String },

    #[error("failed to read targets file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in targets document: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("no target list found in configuration")]
    NoTargets,
}

/// The raw targets document shape.
///
/// Unknown members are tolerated so the document can carry deployment-side
/// annotations without breaking older binaries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsFile {
    /// Process names to terminate, in document order.
    pub processes: Option<Vec<String>>,

    /// Optional daemon interval default (seconds). CLI takes precedence.
    pub interval: Option<u64>,
}

impl TargetsFile {
    /// Parse a targets document from raw text.
    ///
    /// Pure with respect to its input; a malformed document is wrapped into
    /// `ConfigError::Parse` with the underlying cause attached.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse { source })
    }

    /// Extract the target list, enforcing the absent-vs-empty distinction.
    pub fn target_list(&self) -> Result<TargetList, ConfigError> {
        match &self.processes {
            Some(names) => Ok(TargetList::new(names.clone())),
            None => Err(ConfigError::NoTargets),
        }
    }
}

/// Parse raw text straight to a validated `TargetList`.
pub fn parse_targets(raw: &str) -> Result<TargetList, ConfigError> {
    TargetsFile::parse(raw)?.target_list()
}

/// Read and parse the targets document at `path`.
///
/// A read failure surfaces through the same `ConfigError` channel as a parse
/// failure; callers never need to distinguish how loading fell over.
pub fn load_targets_file(path: &Path) -> Result<TargetsFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    TargetsFile::parse(&raw)
}

/// Read, parse, and extract the target list at `path`.
pub fn load_targets(path: &Path) -> Result<TargetList, ConfigError> {
    load_targets_file(path)?.target_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets_in_document_order() {
        let raw = r#"{"processes": ["crashpad_handler", "minidump_uploader", "crashpad_handler"]}"#;
        let targets = parse_targets(raw).unwrap();
        assert_eq!(targets.len(), 3);
        let names: Vec<&str> = targets.iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["crashpad_handler", "minidump_uploader", "crashpad_handler"]
        );
    }

    #[test]
    fn test_parse_preserves_whitespace() {
        let raw = r#"{"processes": ["  spaced  ", "tab\tname"]}"#;
        let targets = parse_targets(raw).unwrap();
        assert!(targets.contains("  spaced  "));
        assert!(targets.contains("tab\tname"));
        assert!(!targets.contains("spaced"));
    }

    #[test]
    fn test_empty_processes_is_valid_and_empty() {
        let targets = parse_targets(r#"{"processes": []}"#).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_absent_processes_is_an_error() {
        let err = parse_targets(r#"{"interval": 600}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
        assert!(err.to_string().contains("no target list found"));
    }

    #[test]
    fn test_null_processes_is_an_error() {
        let err = parse_targets(r#"{"processes": null}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
    }

    #[test]
    fn test_malformed_document_wraps_cause() {
        let err = parse_targets("{not json").unwrap_err();
        match err {
            ConfigError::Parse { source } => {
                assert!(!source.to_string().is_empty());
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_member_type_is_a_parse_error() {
        let err = parse_targets(r#"{"processes": "crashpad_handler"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_members_tolerated() {
        let raw = r#"{"processes": ["a"], "interval": 600, "comment": "ops-managed"}"#;
        let file = TargetsFile::parse(raw).unwrap();
        assert_eq!(file.interval, Some(600));
        assert_eq!(file.target_list().unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = load_targets(Path::new("/nonexistent/targets.json")).unwrap_err();
        match err {
            ConfigError::Read { path, source } => {
                assert_eq!(path, PathBuf::from("/nonexistent/targets.json"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Read error, got {other:?}"),
        }
    }
}
