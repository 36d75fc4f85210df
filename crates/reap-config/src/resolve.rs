//! Targets-file path resolution and discovery.
//!
//! Resolution order: CLI argument → environment variable → working directory
//! → executable directory → XDG config → system config.

use crate::targets::ConfigError;
use crate::{ENV_TARGETS_PATH, TARGETS_FILENAME};
use std::path::{Path, PathBuf};

/// Application name for XDG / system config directories.
const APP_NAME: &str = "process_reaper";

/// Where the targets file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via the REAP_TARGETS environment variable.
    Environment,

    /// Found in the current working directory.
    WorkingDir,

    /// Found next to the executable.
    ExecutableDir,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Found in /etc/process_reaper/.
    SystemConfig,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::WorkingDir => write!(f, "working directory"),
            ConfigSource::ExecutableDir => write!(f, "executable directory"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
        }
    }
}

/// A resolved targets-file path with provenance for diagnostics.
#[derive(Debug, Clone)]
pub struct ResolvedTargets {
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Resolve the targets file path.
///
/// Order:
/// 1. Explicit CLI path — wins unconditionally; a missing file surfaces as a
///    read error rather than falling through to a different document.
/// 2. `REAP_TARGETS` environment variable; a relative value that does not
///    exist in the working directory is retried next to the executable.
/// 3. `targets.json` in the working directory.
/// 4. `targets.json` next to the executable.
/// 5. XDG config (`~/.config/process_reaper/targets.json`).
/// 6. System config (`/etc/process_reaper/targets.json`).
///
/// If nothing resolves, the error lists every path that was attempted.
pub fn resolve_targets_path(cli_path: Option<&Path>) -> Result<ResolvedTargets, ConfigError> {
    if let Some(path) = cli_path {
        return Ok(ResolvedTargets {
            path: path.to_path_buf(),
            source: ConfigSource::CliArgument,
        });
    }

    let mut attempted: Vec<PathBuf> = Vec::new();

    if let Ok(env_path) = std::env::var(ENV_TARGETS_PATH) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedTargets {
                path,
                source: ConfigSource::Environment,
            });
        }
        attempted.push(path);

        // A relative env value gets one more chance next to the executable.
        if let Some(exe_dir) = executable_dir() {
            let exe_relative = exe_dir.join(&env_path);
            if exe_relative.exists() {
                return Ok(ResolvedTargets {
                    path: exe_relative,
                    source: ConfigSource::Environment,
                });
            }
            attempted.push(exe_relative);
        }
    }

    let cwd_path = PathBuf::from(TARGETS_FILENAME);
    if cwd_path.exists() {
        return Ok(ResolvedTargets {
            path: cwd_path,
            source: ConfigSource::WorkingDir,
        });
    }
    attempted.push(cwd_path);

    if let Some(exe_dir) = executable_dir() {
        let path = exe_dir.join(TARGETS_FILENAME);
        if path.exists() {
            return Ok(ResolvedTargets {
                path,
                source: ConfigSource::ExecutableDir,
            });
        }
        attempted.push(path);
    }

    if let Some(xdg_config) = dirs::config_dir() {
        let path = xdg_config.join(APP_NAME).join(TARGETS_FILENAME);
        if path.exists() {
            return Ok(ResolvedTargets {
                path,
                source: ConfigSource::XdgConfig,
            });
        }
        attempted.push(path);
    }

    let system_path = system_config_dir().join(TARGETS_FILENAME);
    if system_path.exists() {
        return Ok(ResolvedTargets {
            path: system_path,
            source: ConfigSource::SystemConfig,
        });
    }
    attempted.push(system_path);

    Err(ConfigError::NotFound {
        attempted: attempted
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Directory containing the current executable, if it can be determined.
fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::WorkingDir), "working directory");
        assert_eq!(
            format!("{}", ConfigSource::ExecutableDir),
            "executable directory"
        );
    }

    #[test]
    fn test_cli_path_wins_even_when_missing() {
        let resolved =
            resolve_targets_path(Some(Path::new("/nonexistent/explicit.json"))).unwrap();
        assert_eq!(resolved.path, PathBuf::from("/nonexistent/explicit.json"));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/process_reaper"));
    }
}
