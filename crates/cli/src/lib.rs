//! p4gate CLI library
//!
//! Command-line front end for the checkout engine: inspect the server
//! session, query file status and open files for edit.

pub mod cmd;
pub mod command;
pub mod common;
pub mod error;
pub mod reporter;
pub mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use p4gate_config::ConnectionConfig;
use p4gate_engine::{Diagnostics, Severity};
use std::path::PathBuf;

use command::Command;
use common::RuntimeContext;
use error::CommandError;

/// Exit code for recoverable failures
pub const EXIT_ERROR: i32 = 1;

/// Exit code for critical failures
pub const EXIT_CRITICAL: i32 = 2;

/// p4gate - safe Perforce checkout for asset pipelines
#[derive(Parser)]
#[command(name = "p4gate")]
#[command(about = "Check Perforce status and open files for edit before overwriting them")]
#[command(version)]
#[command(long_about = "Check Perforce status and open files for edit before overwriting them

p4gate wraps the Perforce command-line client (p4). It batches status
queries, works out each file's lifecycle state, and runs the
add → sync → edit sequence only after every precondition holds.")]
pub struct Cli {
    /// Path to the config file
    #[arg(long, env = "P4GATE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "P4GATE_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Server address, overriding the p4 environment
    #[arg(long, global = true, value_name = "HOST:PORT")]
    pub port: Option<String>,

    /// User name, overriding the p4 environment
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Workspace name, overriding the p4 environment
    #[arg(long, global = true)]
    pub client: Option<String>,

    /// Path to the p4 binary
    #[arg(long, global = true, value_name = "FILE")]
    pub binary: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the p4gate CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Show connection settings and the server session
    Info(cmd::info::InfoCommand),

    /// Show the Perforce status of files
    Status(cmd::status::StatusCommand),

    /// Mark new files for add, sync stale ones and open everything for edit
    Checkout(cmd::checkout::CheckoutCommand),
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut ConnectionConfig) {
        let mut overridden = false;
        for (target, value) in [
            (&mut config.port, &self.port),
            (&mut config.user, &self.user),
            (&mut config.client, &self.client),
        ] {
            if let Some(value) = value {
                *target = Some(value.clone());
                overridden = true;
            }
        }
        if overridden {
            config.override_connection = true;
        }
        if let Some(binary) = &self.binary {
            config.binary = Some(binary.clone());
        }
    }

    /// Config file that will be read, if any
    fn config_file(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| p4gate_config::default_config_file().filter(|path| path.exists()))
    }
}

/// Execute the command based on the command type
fn execute_command(command: &Commands, context: &RuntimeContext) -> error::Result<()> {
    match command {
        Commands::Info(info_cmd) => info_cmd.execute(context),
        Commands::Status(status_cmd) => status_cmd.execute(context),
        Commands::Checkout(checkout_cmd) => checkout_cmd.execute(context),
    }
}

/// Main entry point for the CLI logic
///
/// # Errors
///
/// Returns an error if:
/// - Logging initialization fails
/// - Configuration loading fails
/// - Command execution fails
pub fn run(cli: Cli) -> Result<()> {
    p4gate_config::logging::init(cli.verbose, cli.log_file.as_deref())
        .map_err(CommandError::from)?;

    let mut config = ConnectionConfig::load_or_default(cli.config.as_deref())
        .map_err(CommandError::from)
        .context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    tracing::debug!("Connection settings: {:?}", config);

    let context = RuntimeContext::new(config, cli.config_file());
    execute_command(&cli.command, &context)
        .inspect_err(|err| report_critical(err, &context.diagnostics))?;
    Ok(())
}

/// Send a critical failure through the reporter before the process exits
fn report_critical(err: &CommandError, diagnostics: &Diagnostics) {
    if err.severity() == Severity::Critical {
        diagnostics.critical(err.to_string(), err.remediation().as_deref());
    }
}

/// Whether the error was already shown by [`run`]
pub fn is_reported(err: &anyhow::Error) -> bool {
    severity(err) == Severity::Critical
}

/// Severity of the most specific p4gate error in the chain
fn severity(err: &anyhow::Error) -> Severity {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<CommandError>()
                .map(CommandError::severity)
                .or_else(|| {
                    cause
                        .downcast_ref::<p4gate_engine::Error>()
                        .map(p4gate_engine::Error::severity)
                })
        })
        .unwrap_or(Severity::Error)
}

/// Process exit code for a failed run
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match severity(err) {
        Severity::Critical => EXIT_CRITICAL,
        Severity::Error | Severity::Log => EXIT_ERROR,
    }
}

/// Remediation text carried by the error, if any
pub fn remediation(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<CommandError>()
            .and_then(CommandError::remediation)
    })
}
