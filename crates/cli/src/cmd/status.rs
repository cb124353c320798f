//! Status command implementation
//!
//! Query the server for a set of files in as few round-trips as the batch
//! limit allows and print each file's lifecycle status.

use clap::{Args, ValueEnum};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use owo_colors::OwoColorize;
use p4gate_engine::{FileRecord, FileRecordGroup, FileStatus};
use std::io::IsTerminal;

use crate::command::Command;
use crate::common::{RuntimeContext, resolve_local_path};
use crate::error::Result;
use crate::ui::create_spinner;

/// Output format for status command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table with one row per file
    #[default]
    Table,
    /// JSON array of file records
    Json,
}

/// Show the Perforce status of files
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Treat arguments as depot paths (//depot/...)
    #[arg(long)]
    pub depot: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Files to query
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,
}

impl Command for StatusCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let mut group = if self.depot {
            FileRecordGroup::from_depot_paths(self.paths.iter().cloned())
        } else {
            let paths = self
                .paths
                .iter()
                .map(|path| resolve_local_path(path))
                .collect::<Result<Vec<_>>>()?;
            FileRecordGroup::from_local_paths(paths)
        };

        let spinner = create_spinner(&format!("Querying {} file(s)...", group.len()));
        let result = group.issue_query(&context.runner(), &context.diagnostics);
        spinner.finish_and_clear();
        result?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(group.records())?);
            }
            OutputFormat::Table => {
                let colored = std::io::stdout().is_terminal();
                println!("{}", render_table(group.records(), colored));
            }
        }
        Ok(())
    }
}

fn render_table(records: &[FileRecord], colored: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Status", "Have/Head", "Action", "Opened by"]);

    for record in records {
        let raw = record.raw();
        let revisions = match (raw.have_rev, raw.head_rev) {
            (Some(have), Some(head)) => format!("{have}/{head}"),
            (None, Some(head)) => format!("-/{head}"),
            _ => String::new(),
        };
        let opened_by = record
            .other_checkouts()
            .iter()
            .map(|checkout| checkout.owner.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            record.display_name().to_string(),
            status_label(record.status(), colored),
            revisions,
            raw.action.clone().unwrap_or_default(),
            opened_by,
        ]);
    }
    table
}

fn status_label(status: FileStatus, colored: bool) -> String {
    let label = status.as_str();
    if !colored {
        return label.to_string();
    }
    match status {
        FileStatus::CheckedOutByMe | FileStatus::MarkedForAdd => label.green().to_string(),
        FileStatus::LatestRevision => label.to_string(),
        FileStatus::NotLatestRevision | FileStatus::NotAdded => label.yellow().to_string(),
        FileStatus::CheckedOutByOther | FileStatus::MarkedForDelete | FileStatus::Invalid => {
            label.red().to_string()
        }
        FileStatus::Unknown => label.dimmed().to_string(),
    }
}
