//! CLI end-to-end tests for the reap binary.
//!
//! Exercise exit codes and user-visible output for the safe command paths:
//! configuration failures, argument rejection, no-op passes against names
//! that cannot exist, and check/version reporting. Nothing here kills a real
//! process.

use assert_cmd::Command;
use predicates::prelude::*;

fn reap() -> Command {
    let mut cmd = Command::cargo_bin("reap").expect("reap binary");
    cmd.env_remove("REAP_TARGETS");
    cmd
}

fn write_targets(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("targets.json");
    std::fs::write(&path, contents).expect("write targets file");
    path
}

#[test]
fn oneshot_with_missing_targets_exits_config_error() {
    reap()
        .args(["oneshot", "--targets", "/nonexistent/reap-e2e/targets.json"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn oneshot_with_interval_only_document_exits_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_targets(&dir, r#"{"interval": 600}"#);

    reap()
        .arg("oneshot")
        .arg("--targets")
        .arg(&path)
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("no target list found"));
}

#[test]
fn oneshot_with_unmatched_target_exits_clean() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_targets(&dir, r#"{"processes": ["reap-e2e-no-such-process"]}"#);

    reap()
        .arg("oneshot")
        .arg("--targets")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("reap pass complete"));
}

#[test]
fn oneshot_with_empty_targets_warns_and_exits_clean() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_targets(&dir, r#"{"processes": []}"#);

    reap()
        .arg("oneshot")
        .arg("--targets")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "No targets specified in configuration.",
        ));
}

#[test]
fn oneshot_json_format_emits_stats_payload() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_targets(&dir, r#"{"processes": ["reap-e2e-no-such-process"]}"#);

    let output = reap()
        .arg("oneshot")
        .arg("--format")
        .arg("json")
        .arg("--targets")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .clone();

    let stats: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(stats["targets"], 1);
    assert_eq!(stats["matched"], 0);
}

#[test]
fn daemon_rejects_non_positive_interval() {
    reap()
        .args(["daemon", "--interval", "0"])
        .assert()
        .failure()
        .code(11)
        .stderr(predicate::str::contains("interval must be positive"));
}

#[test]
fn check_reports_resolved_targets() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_targets(
        &dir,
        r#"{"processes": ["crashpad_handler", "minidump_uploader"], "interval": 600}"#,
    );

    reap()
        .arg("check")
        .arg("--targets")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("targets: 2"))
        .stdout(predicate::str::contains("crashpad_handler"))
        .stdout(predicate::str::contains("interval: 600s"));
}

#[test]
fn check_json_format_is_machine_readable() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_targets(&dir, r#"{"processes": ["a", "b", "c"]}"#);

    let output = reap()
        .arg("check")
        .arg("-f")
        .arg("json")
        .arg("--targets")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .clone();

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(report["target_count"], 3);
    assert_eq!(report["source"], "CLI argument");
}

#[test]
fn version_prints_package_version() {
    reap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
