//! Host service-manager registration (systemd).
//!
//! A thin wrapper over `systemctl` plus unit-file management. The service
//! itself is just the execution loop started by the unit's
//! `service run --interval N` command line; everything here is plumbing
//! around the OS service manager.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Registered unit name.
pub const SERVICE_NAME: &str = "process-reaper";

const UNIT_FILENAME: &str = "process-reaper.service";
const UNIT_DIR: &str = "/etc/systemd/system";

/// Errors from service registration/unregistration.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("root privileges are required to {action} the service")]
    NotRoot { action: &'static str },

    #[error("unable to determine executable path: {0}")]
    ExePath(#[source] std::io::Error),

    #[error("failed to write unit file {path}: {source}")]
    UnitWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove unit file {path}: {source}")]
    UnitRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to execute systemctl: {0}")]
    SystemctlSpawn(#[source] std::io::Error),

    #[error("systemctl {args} exited with {status}")]
    SystemctlFailed {
        args: String,
        status: std::process::ExitStatus,
    },
}

/// Whether the current process runs with root privileges.
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Path of the installed unit file.
pub fn unit_path() -> PathBuf {
    Path::new(UNIT_DIR).join(UNIT_FILENAME)
}

/// Render the unit file for the given executable and interval.
pub fn unit_file_contents(exe: &Path, interval_secs: u64) -> String {
    format!(
        "[Unit]\n\
         Description=Process Reaper - terminates configured stray processes\n\
         After=network.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={exe} service run --interval {interval}\n\
         Restart=on-failure\n\
         RestartSec=5\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        exe = exe.display(),
        interval = interval_secs,
    )
}

/// Install and enable the service unit.
pub fn install(interval_secs: u64) -> Result<(), ServiceError> {
    if !is_root() {
        return Err(ServiceError::NotRoot { action: "install" });
    }

    let exe = std::env::current_exe().map_err(ServiceError::ExePath)?;
    let path = unit_path();
    std::fs::write(&path, unit_file_contents(&exe, interval_secs)).map_err(|source| {
        ServiceError::UnitWrite {
            path: path.clone(),
            source,
        }
    })?;

    run_systemctl(&["daemon-reload"])?;
    run_systemctl(&["enable", SERVICE_NAME])?;
    Ok(())
}

/// Stop, disable, and remove the service unit.
pub fn uninstall() -> Result<(), ServiceError> {
    if !is_root() {
        return Err(ServiceError::NotRoot { action: "uninstall" });
    }

    // A service that is not running/enabled is fine; only removal and the
    // final reload are load-bearing.
    let _ = run_systemctl(&["stop", SERVICE_NAME]);
    let _ = run_systemctl(&["disable", SERVICE_NAME]);

    let path = unit_path();
    if path.exists() {
        std::fs::remove_file(&path).map_err(|source| ServiceError::UnitRemove {
            path: path.clone(),
            source,
        })?;
    }

    run_systemctl(&["daemon-reload"])?;
    Ok(())
}

/// Whether the unit file is present.
pub fn is_installed() -> bool {
    unit_path().exists()
}

/// Current activation state as reported by systemd.
///
/// `systemctl is-active` exits non-zero for inactive units; its stdout is
/// still the answer, so only a spawn failure is an error here.
pub fn status() -> Result<String, ServiceError> {
    let output = Command::new("systemctl")
        .args(["is-active", SERVICE_NAME])
        .output()
        .map_err(ServiceError::SystemctlSpawn)?;

    let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if state.is_empty() {
        Ok("unknown".to_string())
    } else {
        Ok(state)
    }
}

fn run_systemctl(args: &[&str]) -> Result<(), ServiceError> {
    let status = Command::new("systemctl")
        .args(args)
        .status()
        .map_err(ServiceError::SystemctlSpawn)?;

    if status.success() {
        Ok(())
    } else {
        Err(ServiceError::SystemctlFailed {
            args: args.join(" "),
            status,
        })
    }
}
