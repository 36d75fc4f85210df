//! Process identity and target-list types.
//!
//! A process is identified by its executable name and numeric pid at the
//! instant of enumeration. Records are snapshots: a fresh batch is produced
//! per enumeration call and nothing outlives its batch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
///
/// Pid 0 is valid (the system idle process on some platforms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(pid: u32) -> Self {
        Pid(pid)
    }
}

/// A single row of the process table at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Executable name (basename only, no path, no arguments).
    pub name: String,

    /// Process ID.
    pub pid: Pid,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid: Pid(pid),
        }
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pid {})", self.name, self.pid)
    }
}

/// The ordered list of process names eligible for termination.
///
/// Names are kept exactly as parsed from the targets document: no trimming,
/// no case-folding. Matching elsewhere is plain string equality, so the
/// list is the single source of truth for what "the same name" means.
///
/// An empty list is a valid configuration (a no-op run, not an error).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetList(Vec<String>);

impl TargetList {
    pub fn new(names: Vec<String>) -> Self {
        TargetList(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TargetList {
    fn from(names: Vec<String>) -> Self {
        TargetList(names)
    }
}

impl From<Vec<&str>> for TargetList {
    fn from(names: Vec<&str>) -> Self {
        TargetList(names.into_iter().map(String::from).collect())
    }
}

impl<'a> IntoIterator for &'a TargetList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(100).to_string(), "100");
        assert_eq!(Pid(0).to_string(), "0");
    }

    #[test]
    fn test_process_record_display() {
        let rec = ProcessRecord::new("crashpad_handler", 100);
        assert_eq!(rec.to_string(), "crashpad_handler (pid 100)");
    }

    #[test]
    fn test_target_list_contains_is_exact() {
        let targets = TargetList::from(vec!["crashpad_handler", " padded "]);
        assert!(targets.contains("crashpad_handler"));
        assert!(targets.contains(" padded "));
        // No case-folding, no trimming.
        assert!(!targets.contains("Crashpad_Handler"));
        assert!(!targets.contains("padded"));
    }

    #[test]
    fn test_target_list_preserves_order() {
        let targets = TargetList::from(vec!["b", "a", "c"]);
        let names: Vec<&str> = targets.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_target_list_is_valid() {
        let targets = TargetList::default();
        assert!(targets.is_empty());
        assert_eq!(targets.len(), 0);
        assert!(!targets.contains("anything"));
    }
}
