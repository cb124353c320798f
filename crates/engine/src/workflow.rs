//! Checkout workflow
//!
//! Prepares files for modification: reachability, workspace root,
//! batched refresh, preconditions, then add, forced sync and edit, each step
//! optionally confirmed, and finally a re-query that verifies every file
//! ended up writable.

use crate::command::P4Command;
use crate::group::FileRecordGroup;
use crate::record::FileRecord;
use crate::runner::CommandRunner;
use crate::session::ServerSession;
use crate::status::FileStatus;
use crate::Result;
use p4gate_core::Diagnostics;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Whether mutating steps ask before running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Each step asks the [`Confirm`] implementation first
    Interactive,
    /// Steps run unconditionally and errors are not interruptive
    #[default]
    Silent,
}

/// A mutating step of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Add,
    Sync,
    Edit,
}

impl CheckoutStep {
    pub const fn command(self) -> P4Command {
        match self {
            Self::Add => P4Command::Add,
            Self::Sync => P4Command::SyncForce,
            Self::Edit => P4Command::Edit,
        }
    }

    /// Question put to the user before the step runs
    pub fn prompt(self, count: usize) -> String {
        let files = if count == 1 { "file" } else { "files" };
        match self {
            Self::Add => format!("Mark {count} new {files} for add?"),
            Self::Sync => format!("Sync {count} {files} to the latest revision, overwriting local copies?"),
            Self::Edit => format!("Check out {count} {files} for edit?"),
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Sync => "sync",
            Self::Edit => "edit",
        })
    }
}

/// Caller-supplied confirmation for mutating steps
pub trait Confirm {
    fn confirm(&self, step: CheckoutStep, files: &[String]) -> bool;
}

/// Accepts every step
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _step: CheckoutStep, _files: &[String]) -> bool {
        true
    }
}

/// Reloads an open document after its file changed on disk
pub trait WorkingCopyReloader {
    fn reload(&self, path: &str) -> Result<()>;
}

/// Drives add, sync and edit for a set of files
pub struct CheckoutWorkflow<'a> {
    runner: &'a CommandRunner<'a>,
    diagnostics: &'a Diagnostics,
    confirm: &'a dyn Confirm,
    mode: InteractionMode,
}

impl<'a> CheckoutWorkflow<'a> {
    /// Silent workflow that runs every step unconditionally
    pub fn new(runner: &'a CommandRunner<'a>, diagnostics: &'a Diagnostics) -> Self {
        Self {
            runner,
            diagnostics,
            confirm: &AlwaysConfirm,
            mode: InteractionMode::Silent,
        }
    }

    /// Ask `confirm` before every mutating step
    #[must_use]
    pub fn interactive(mut self, confirm: &'a dyn Confirm) -> Self {
        self.confirm = confirm;
        self.mode = InteractionMode::Interactive;
        self
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    fn silent(&self) -> bool {
        self.mode == InteractionMode::Silent
    }

    /// Prepare one local file for modification
    pub fn open_for_edit(&self, path: &str) -> Result<bool> {
        let mut group = FileRecordGroup::from_local_paths([path]);
        self.execute(&mut group, None)
    }

    /// Prepare every file in `group` for modification
    pub fn open_for_edit_many(&self, group: &mut FileRecordGroup) -> Result<bool> {
        self.execute(group, None)
    }

    /// Prepare an open scene file, reloading it if a sync replaced it
    pub fn open_for_edit_scene(
        &self,
        path: &str,
        reloader: &dyn WorkingCopyReloader,
    ) -> Result<bool> {
        let mut group = FileRecordGroup::from_local_paths([path]);
        self.execute(&mut group, Some(reloader))
    }

    #[tracing::instrument(skip_all, fields(files = group.len(), mode = ?self.mode))]
    fn execute(
        &self,
        group: &mut FileRecordGroup,
        reloader: Option<&dyn WorkingCopyReloader>,
    ) -> Result<bool> {
        let silent = self.silent();

        let session = ServerSession::connect(self.runner)?;
        if !session.is_reachable(self.diagnostics, silent) {
            return Ok(false);
        }

        if !group.all_under_root(session.client_root(), self.diagnostics, silent) {
            return Ok(false);
        }

        group.issue_query(self.runner, self.diagnostics)?;

        if !group.check_preconditions(self.diagnostics, silent) {
            return Ok(false);
        }

        if !self.add_new_files(group)? {
            return Ok(false);
        }

        if !self.sync_stale_files(group, reloader)? {
            return Ok(false);
        }

        let edit_exclude = [
            FileStatus::NotAdded,
            FileStatus::MarkedForAdd,
            FileStatus::CheckedOutByMe,
        ];
        if !self.run_step(group, CheckoutStep::Edit, None, Some(&edit_exclude))? {
            return Ok(false);
        }

        group.issue_query(self.runner, self.diagnostics)?;
        self.verify(group)
    }

    fn add_new_files(&self, group: &FileRecordGroup) -> Result<bool> {
        let include = [FileStatus::NotAdded];
        let pending = group.select(Some(&include), None);
        if pending.is_empty() {
            return Ok(true);
        }

        if !self.confirmed(CheckoutStep::Add, &pending) {
            return Ok(false);
        }

        let mut locals = Vec::with_capacity(pending.len());
        for record in &pending {
            let Some(local) = record.resolved_local_path() else {
                return Ok(self.diagnostics.error(
                    format!("{} has no local path to add", record.display_name()),
                    Some("Map the depot path into your workspace first."),
                    self.silent(),
                ));
            };
            locals.push(Path::new(local));
        }

        let mut created = Vec::new();
        for local in locals {
            match create_placeholder(local) {
                Ok(true) => created.push(local),
                Ok(false) => {}
                Err(err) => {
                    remove_placeholders(&created);
                    return Err(err);
                }
            }
        }

        if let Err(err) = group.issue_command(self.runner, P4Command::Add, Some(&include), None) {
            remove_placeholders(&created);
            return Err(err);
        }
        Ok(true)
    }

    fn sync_stale_files(
        &self,
        group: &FileRecordGroup,
        reloader: Option<&dyn WorkingCopyReloader>,
    ) -> Result<bool> {
        let include = [FileStatus::NotLatestRevision];
        if !self.run_step(group, CheckoutStep::Sync, Some(&include), None)? {
            return Ok(false);
        }

        if let Some(reloader) = reloader {
            for record in group.select(Some(&include), None) {
                if let Some(local) = record.resolved_local_path() {
                    debug!("Reloading {}", local);
                    reloader.reload(local)?;
                }
            }
        }
        Ok(true)
    }

    /// Confirm and run one step; `Ok(false)` when the user declined
    fn run_step(
        &self,
        group: &FileRecordGroup,
        step: CheckoutStep,
        include: Option<&[FileStatus]>,
        exclude: Option<&[FileStatus]>,
    ) -> Result<bool> {
        let pending = group.select(include, exclude);
        if pending.is_empty() {
            return Ok(true);
        }

        if !self.confirmed(step, &pending) {
            return Ok(false);
        }

        group.issue_command(self.runner, step.command(), include, exclude)?;
        Ok(true)
    }

    fn confirmed(&self, step: CheckoutStep, records: &[&FileRecord]) -> bool {
        if self.silent() {
            return true;
        }

        let files: Vec<String> = records
            .iter()
            .map(|record| record.display_name().to_string())
            .collect();
        if self.confirm.confirm(step, &files) {
            return true;
        }

        self.diagnostics.log(format!("Checkout cancelled at {step} step"));
        false
    }

    fn verify(&self, group: &FileRecordGroup) -> Result<bool> {
        let offenders: Vec<String> = group
            .records()
            .iter()
            .filter(|record| !record.status().is_writable())
            .map(|record| format!("{} ({})", record.display_name(), record.status()))
            .collect();

        if offenders.is_empty() {
            info!("{} file(s) ready for edit", group.len());
            return Ok(true);
        }

        Ok(self.diagnostics.error(
            format!(
                "Could not open for edit:\n  {}",
                offenders.join("\n  ")
            ),
            Some("Check the files in Perforce; they may need to be resolved or reverted."),
            self.silent(),
        ))
    }
}

/// Create an empty file so it can be marked for add
///
/// Returns whether a file was created.
fn create_placeholder(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::File::create(path)?;
    debug!("Created placeholder {}", path.display());
    Ok(true)
}

/// Delete placeholders left behind by a failed add
///
/// Parent directories created on the way stay.
fn remove_placeholders(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed placeholder {}", path.display()),
            Err(err) => warn!("Could not remove placeholder {}: {}", path.display(), err),
        }
    }
}
