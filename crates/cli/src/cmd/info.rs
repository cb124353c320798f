//! Info command implementation
//!
//! Show the connection settings, the resolved client binary and the identity
//! the server reports for them.

use clap::Args;
use owo_colors::OwoColorize;
use p4gate_core::platform::CURRENT_PLATFORM;
use p4gate_engine::ServerSession;
use p4gate_engine::runner::resolve_binary;
use serde::Serialize;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;
use crate::ui::create_spinner;

const NOT_SET: &str = "not set";

/// Display connection and server information
#[derive(Debug, Args)]
pub struct InfoCommand {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoData {
    config_file: Option<String>,
    binary: Option<String>,
    binary_exists: bool,
    platform: String,
    override_connection: bool,
    timeout_secs: u64,
    max_batch_length: usize,
    session: ServerSession,
}

impl Command for InfoCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let binary = resolve_binary(&context.config).ok();

        let spinner = create_spinner("Querying Perforce server...");
        let session = ServerSession::query(&context.runner());
        spinner.finish_and_clear();
        let session = session?;

        let data = InfoData {
            config_file: context
                .config_file
                .as_ref()
                .map(|path| path.display().to_string()),
            binary_exists: binary.as_ref().is_some_and(|path| path.exists()),
            binary: binary.map(|path| path.display().to_string()),
            platform: format!("{}-{}", CURRENT_PLATFORM.os, CURRENT_PLATFORM.arch),
            override_connection: context.config.override_connection,
            timeout_secs: context.config.timeout_secs,
            max_batch_length: context.config.max_batch_length,
            session,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&data)?);
        } else {
            print_human(&data);
        }
        Ok(())
    }
}

fn print_human(data: &InfoData) {
    let session = &data.session;

    println!("{}", "p4gate".bold());
    row("Config", data.config_file.as_deref());
    row("Client binary", data.binary.as_deref());
    row("Platform", Some(&data.platform));
    row(
        "Timeout",
        Some(&format!("{} seconds", data.timeout_secs)),
    );
    row(
        "Batch length",
        Some(&data.max_batch_length.to_string()),
    );

    println!();
    println!("{}", "Server".bold());
    row("User", Some(session.user()));
    row("Workspace", Some(session.client_name()));
    row(
        "Workspace root",
        Some(&session.client_root().display().to_string()),
    );
    row("Host", session.client_host());
    row("Address", session.server_address());
    row("Uptime", session.server_uptime());
    row("Version", session.server_version());
}

fn row(label: &str, value: Option<&str>) {
    match value {
        Some(value) => println!("  {:<16}{}", label, value.cyan()),
        None => println!("  {:<16}{}", label, NOT_SET.dimmed()),
    }
}
