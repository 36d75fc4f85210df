//! Process enumeration via /proc (Linux).
//!
//! Walks the numeric entries of /proc and reads each `comm` file for the
//! executable name. Processes that exit between the directory walk and the
//! comm read are skipped; a scan never fails because the table changed under
//! it.

use super::CollectError;
use reap_common::ProcessRecord;
use tracing::debug;

pub(super) fn snapshot() -> Result<Vec<ProcessRecord>, CollectError> {
    let mut records = Vec::new();

    for entry in std::fs::read_dir("/proc")? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        let file_name = entry.file_name();
        let pid = match file_name.to_str().and_then(|s| s.parse::<u32>().ok()) {
            Some(pid) => pid,
            None => continue, // non-process entry (sys, meminfo, ...)
        };

        match std::fs::read_to_string(entry.path().join("comm")) {
            Ok(comm) => {
                let name = comm.trim_end_matches('\n').to_string();
                records.push(ProcessRecord::new(name, pid));
            }
            // Process vanished mid-scan or is otherwise unreadable.
            Err(_) => continue,
        }
    }

    debug!(process_count = records.len(), "proc scan completed");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_sees_pid_1() {
        let table = snapshot().expect("snapshot");
        assert!(table.iter().any(|r| r.pid.0 == 1), "pid 1 missing");
    }

    #[test]
    fn scan_reports_comm_for_self() {
        let table = snapshot().expect("snapshot");
        let own = table
            .iter()
            .find(|r| r.pid.0 == std::process::id())
            .expect("own process present");
        assert!(!own.name.is_empty());
    }
}
