//! Process enumeration via ps (non-Linux Unix).
//!
//! Single `ps -axo pid=,comm=` invocation; BSD ps reports comm as a full
//! path, so names are reduced to their basename to match the Linux scan.

use super::CollectError;
use reap_common::ProcessRecord;
use std::process::Command;
use tracing::debug;

pub(super) fn snapshot() -> Result<Vec<ProcessRecord>, CollectError> {
    let output = Command::new("ps")
        .args(["-axo", "pid=,comm="])
        .output()
        .map_err(|e| CollectError::CommandFailed(e.to_string()))?;

    if !output.status.success() {
        return Err(CollectError::CommandFailed(format!(
            "ps exited with {}",
            output.status
        )));
    }

    let records = parse_ps_output(&String::from_utf8_lossy(&output.stdout))?;
    debug!(process_count = records.len(), "ps scan completed");
    Ok(records)
}

fn parse_ps_output(stdout: &str) -> Result<Vec<ProcessRecord>, CollectError> {
    let mut records = Vec::new();

    for (line_num, line) in stdout.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (pid_field, comm_field) =
            line.split_once(char::is_whitespace)
                .ok_or_else(|| CollectError::ParseError {
                    message: "missing comm column".to_string(),
                    line_num: line_num + 1,
                })?;

        let pid = pid_field
            .parse::<u32>()
            .map_err(|e| CollectError::ParseError {
                message: format!("bad pid {pid_field:?}: {e}"),
                line_num: line_num + 1,
            })?;

        // comm may contain spaces; only the leading path is stripped.
        let comm = comm_field.trim_start();
        let name = comm.rsplit('/').next().unwrap_or(comm).to_string();
        records.push(ProcessRecord::new(name, pid));
    }

    Ok(records)
}
