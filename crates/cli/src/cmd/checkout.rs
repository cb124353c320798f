//! Checkout command implementation
//!
//! Runs the add, sync and edit workflow for the given files so they can be
//! overwritten safely.

use clap::Args;
use owo_colors::OwoColorize;
use p4gate_engine::{AlwaysConfirm, CheckoutWorkflow, FileRecordGroup};
use std::io::IsTerminal;

use crate::command::Command;
use crate::common::{RuntimeContext, resolve_local_path};
use crate::error::{CommandError, Result};
use crate::ui::{PromptConfirm, create_spinner};

/// Prepare files for modification
#[derive(Debug, Args)]
pub struct CheckoutCommand {
    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Run without prompts and keep recoverable errors out of the terminal
    #[arg(long, conflicts_with = "yes")]
    pub silent: bool,

    /// Files to check out
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,
}

/// How confirmations are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmSource {
    Silent,
    Automatic,
    Prompt,
}

impl CheckoutCommand {
    fn confirm_source(&self, stdin_is_terminal: bool) -> ConfirmSource {
        if self.silent {
            ConfirmSource::Silent
        } else if self.yes || !stdin_is_terminal {
            ConfirmSource::Automatic
        } else {
            ConfirmSource::Prompt
        }
    }
}

impl ConfirmSource {
    /// A spinner would draw over dialoguer prompts
    fn shows_spinner(self) -> bool {
        self == Self::Automatic
    }
}

impl Command for CheckoutCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let paths = self
            .paths
            .iter()
            .map(|path| resolve_local_path(path))
            .collect::<Result<Vec<_>>>()?;
        let mut group = FileRecordGroup::from_local_paths(paths);

        let runner = context.runner();
        let workflow = CheckoutWorkflow::new(&runner, &context.diagnostics);
        let source = self.confirm_source(std::io::stdin().is_terminal());
        let workflow = match source {
            ConfirmSource::Silent => workflow,
            ConfirmSource::Automatic => workflow.interactive(&AlwaysConfirm),
            ConfirmSource::Prompt => workflow.interactive(&PromptConfirm),
        };

        let spinner = source
            .shows_spinner()
            .then(|| create_spinner(&format!("Checking out {} file(s)...", group.len())));
        let result = workflow.open_for_edit_many(&mut group);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if !result? {
            return Err(CommandError::CheckoutIncomplete { files: group.len() });
        }

        for record in group.records() {
            println!(
                "{} {} {}",
                "✓".green(),
                record.display_name(),
                record.status().as_str().dimmed()
            );
        }
        Ok(())
    }
}
