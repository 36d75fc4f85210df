//! Process Reaper - scheduled termination of configured stray processes
//!
//! The main entry point for reap, handling:
//! - Single-pass (oneshot) and looping (daemon) execution
//! - systemd service registration and the in-service run mode
//! - Configuration validation (check)

use clap::{Args, Parser, Subcommand};
use reap_common::OutputFormat;
use reap_config::{load_targets, load_targets_file, resolve_targets_path, ConfigError};
use reap_core::daemon::{CancelToken, DaemonError, ExecutionLoop, LoopConfig};
use reap_core::engine::ReapEngine;
use reap_core::exit_codes::ExitCode;
use reap_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use reap_core::service;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info};

/// Default inter-tick interval (seconds) when neither the CLI nor the
/// targets document provides one.
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Process Reaper - terminates processes matching a configured target list
#[derive(Parser)]
#[command(name = "reap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to the targets file (REAP_TARGETS env var is honored during
    /// resolution when this flag is absent)
    #[arg(long, global = true)]
    targets: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single reap pass, then exit
    Oneshot,

    /// Run the reap loop on a schedule
    Daemon(DaemonArgs),

    /// Host service-manager registration (systemd)
    Service(ServiceArgs),

    /// Validate configuration and environment
    Check,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct DaemonArgs {
    /// Execution interval in seconds (default 60, or the targets file's
    /// interval member)
    #[arg(long)]
    interval: Option<i64>,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    #[command(subcommand)]
    command: ServiceCommands,
}

#[derive(Subcommand, Debug)]
enum ServiceCommands {
    /// Register the service unit and enable it
    Install {
        /// Execution interval in seconds baked into the unit
        #[arg(long)]
        interval: Option<i64>,
    },

    /// Stop, disable, and remove the service unit
    Uninstall,

    /// Report the unit's activation state
    Status,

    /// Entry point invoked by the unit; behaves as daemon mode
    Run {
        /// Execution interval in seconds
        #[arg(long)]
        interval: Option<i64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.global.quiet {
        LogLevel::Error
    } else {
        match cli.global.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    };

    let log_config = LogConfig {
        level: log_level,
        format: cli.global.log_format.unwrap_or_default(),
        timestamps: true,
    };
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Oneshot => run_oneshot(&cli.global),
        Commands::Daemon(args) => run_loop(&cli.global, args.interval),
        Commands::Service(args) => run_service(&cli.global, &args),
        Commands::Check => run_check(&cli.global),
        Commands::Version => {
            println!("reap {}", env!("CARGO_PKG_VERSION"));
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_oneshot(global: &GlobalOpts) -> ExitCode {
    let engine = ReapEngine::with_system_defaults();
    let mut exec = ExecutionLoop::new(LoopConfig::oneshot(), engine);

    let targets_path = global.targets.clone();
    match exec.run(move || load_resolved_targets(targets_path)) {
        Ok(summary) => {
            if let Some(stats) = summary.last_stats {
                match global.format {
                    OutputFormat::Json => match serde_json::to_string(&stats) {
                        Ok(json) => println!("{json}"),
                        Err(err) => {
                            error!("failed to serialize stats: {err}");
                            return ExitCode::InternalError;
                        }
                    },
                    OutputFormat::Text => println!(
                        "reap pass complete: {} matched, {} terminated, {} failed",
                        stats.matched, stats.terminated, stats.failed
                    ),
                }
            }
            ExitCode::Clean
        }
        Err(err) => report_loop_failure(&err),
    }
}

fn run_loop(global: &GlobalOpts, cli_interval: Option<i64>) -> ExitCode {
    // Argument validation precedes any file IO: a broken schedule never
    // begins, whatever state the configuration is in.
    if let Some(secs) = cli_interval {
        if secs <= 0 {
            error!("interval must be positive, got {secs}");
            eprintln!("error: interval must be positive, got {secs}");
            return ExitCode::ArgsError;
        }
    }

    let resolved = match resolve_targets_path(global.targets.as_deref()) {
        Ok(resolved) => resolved,
        Err(err) => return report_config_failure(&err),
    };

    let interval_secs = match cli_interval {
        Some(secs) => secs as u64,
        // Fall back to the document's interval member, then the default.
        None => match load_targets_file(&resolved.path) {
            Ok(file) => file.interval.unwrap_or(DEFAULT_INTERVAL_SECS),
            Err(err) => return report_config_failure(&err),
        },
    };

    let engine = ReapEngine::with_system_defaults();
    let config = LoopConfig::daemon(Duration::from_secs(interval_secs));
    let mut exec = ExecutionLoop::new(config, engine);
    install_stop_handlers(exec.cancel_token());

    info!(
        path = %resolved.path.display(),
        source = %resolved.source,
        interval_secs,
        "starting reap daemon"
    );

    let path = resolved.path;
    match exec.run(move || load_targets(&path)) {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                cancelled = summary.cancelled,
                "reap daemon stopped"
            );
            ExitCode::Clean
        }
        Err(err) => report_loop_failure(&err),
    }
}

fn run_service(global: &GlobalOpts, args: &ServiceArgs) -> ExitCode {
    match &args.command {
        ServiceCommands::Install { interval } => {
            let interval_secs = match interval {
                Some(secs) if *secs <= 0 => {
                    error!("interval must be positive, got {secs}");
                    eprintln!("error: interval must be positive, got {secs}");
                    return ExitCode::ArgsError;
                }
                Some(secs) => *secs as u64,
                None => DEFAULT_INTERVAL_SECS,
            };
            match service::install(interval_secs) {
                Ok(()) => {
                    println!("Service '{}' installed successfully.", service::SERVICE_NAME);
                    ExitCode::Clean
                }
                Err(err) => report_service_failure(&err),
            }
        }
        ServiceCommands::Uninstall => match service::uninstall() {
            Ok(()) => {
                println!(
                    "Service '{}' uninstalled successfully.",
                    service::SERVICE_NAME
                );
                ExitCode::Clean
            }
            Err(err) => report_service_failure(&err),
        },
        ServiceCommands::Status => {
            if !service::is_installed() {
                println!("Service '{}' is not installed.", service::SERVICE_NAME);
                return ExitCode::Clean;
            }
            match service::status() {
                Ok(state) => {
                    println!("Service '{}' is {}.", service::SERVICE_NAME, state);
                    ExitCode::Clean
                }
                Err(err) => report_service_failure(&err),
            }
        }
        ServiceCommands::Run { interval } => run_loop(global, *interval),
    }
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let resolved = match resolve_targets_path(global.targets.as_deref()) {
        Ok(resolved) => resolved,
        Err(err) => return report_config_failure(&err),
    };

    let file = match load_targets_file(&resolved.path) {
        Ok(file) => file,
        Err(err) => return report_config_failure(&err),
    };
    let targets = match file.target_list() {
        Ok(targets) => targets,
        Err(err) => return report_config_failure(&err),
    };

    match global.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "path": resolved.path,
                "source": resolved.source.to_string(),
                "target_count": targets.len(),
                "targets": targets.as_slice(),
                "interval": file.interval,
            });
            println!("{report}");
        }
        OutputFormat::Text => {
            println!("targets file: {} ({})", resolved.path.display(), resolved.source);
            println!("targets: {}", targets.len());
            for target in &targets {
                println!("  {target}");
            }
            if let Some(interval) = file.interval {
                println!("interval: {interval}s");
            }
        }
    }
    ExitCode::Clean
}

// ============================================================================
// Failure reporting and signal plumbing
// ============================================================================

fn report_config_failure(err: &ConfigError) -> ExitCode {
    error!("{err}");
    eprintln!("error: {err}");
    ExitCode::ConfigError
}

fn report_loop_failure(err: &DaemonError) -> ExitCode {
    error!("{err}");
    eprintln!("error: {err}");
    match err {
        DaemonError::Config(_) => ExitCode::ConfigError,
        DaemonError::InvalidInterval { .. } => ExitCode::ArgsError,
        DaemonError::Tick { .. } => ExitCode::IoError,
    }
}

fn report_service_failure(err: &service::ServiceError) -> ExitCode {
    error!("{err}");
    eprintln!("error: {err}");
    match err {
        service::ServiceError::NotRoot { .. } => ExitCode::PermissionError,
        _ => ExitCode::ServiceError,
    }
}

fn load_resolved_targets(
    cli_path: Option<PathBuf>,
) -> Result<reap_common::TargetList, ConfigError> {
    let resolved = resolve_targets_path(cli_path.as_deref())?;
    info!(
        path = %resolved.path.display(),
        source = %resolved.source,
        "loading targets"
    );
    load_targets(&resolved.path)
}

static STOP_TOKEN: OnceLock<CancelToken> = OnceLock::new();

extern "C" fn handle_stop_signal(_sig: libc::c_int) {
    if let Some(token) = STOP_TOKEN.get() {
        token.cancel();
    }
}

/// Route SIGINT/SIGTERM into the loop's cancel flag so a stop request ends
/// the run after the in-flight tick instead of mid-kill.
fn install_stop_handlers(token: CancelToken) {
    let _ = STOP_TOKEN.set(token);
    #[cfg(unix)]
    unsafe {
        let handler = handle_stop_signal as extern "C" fn(libc::c_int);
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}
