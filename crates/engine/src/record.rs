//! Tracked file record
//!
//! A [`FileRecord`] is identified by a depot path, a local path or both. Its
//! raw fields and derived status change together and only through a refresh,
//! so the pair is always consistent.

use crate::command::P4Command;
use crate::parser::{StatusEntry, parse_status_response};
use crate::runner::CommandRunner;
use crate::session::classify_failure;
use crate::status::{self, FileStatus, OtherCheckout, RawFields};
use crate::{Error, Result};
use p4gate_core::Diagnostics;
use p4gate_core::path::{is_under_root, paths_equal};
use p4gate_core::platform::CURRENT_PLATFORM;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// One tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    depot_path: Option<String>,
    local_path: Option<String>,
    raw: RawFields,
    status: FileStatus,
}

impl FileRecord {
    /// Create a record from either or both paths
    ///
    /// # Errors
    ///
    /// [`Error::MissingIdentity`] when neither path is given.
    pub fn new(depot_path: Option<String>, local_path: Option<String>) -> Result<Self> {
        if depot_path.is_none() && local_path.is_none() {
            return Err(Error::MissingIdentity);
        }
        Ok(Self {
            depot_path,
            local_path,
            raw: RawFields::default(),
            status: FileStatus::Unknown,
        })
    }

    pub fn from_local(path: impl Into<String>) -> Self {
        Self {
            depot_path: None,
            local_path: Some(path.into()),
            raw: RawFields::default(),
            status: FileStatus::Unknown,
        }
    }

    pub fn from_depot(path: impl Into<String>) -> Self {
        Self {
            depot_path: Some(path.into()),
            local_path: None,
            raw: RawFields::default(),
            status: FileStatus::Unknown,
        }
    }

    pub fn depot_path(&self) -> Option<&str> {
        self.depot_path.as_deref()
    }

    pub fn local_path(&self) -> Option<&str> {
        self.local_path.as_deref()
    }

    /// Raw fields from the last refresh
    pub fn raw(&self) -> &RawFields {
        &self.raw
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn is_mapped(&self) -> bool {
        self.raw.is_mapped
    }

    pub fn not_in_client_view(&self) -> bool {
        self.raw.not_in_client_view
    }

    pub fn other_checkouts(&self) -> &[OtherCheckout] {
        &self.raw.other_checkouts
    }

    /// Local path if known, else the depot path
    pub fn display_name(&self) -> &str {
        self.local_path
            .as_deref()
            .or(self.depot_path.as_deref())
            .unwrap_or_default()
    }

    /// Local path, falling back to the client path the server reported
    pub fn resolved_local_path(&self) -> Option<&str> {
        self.local_path
            .as_deref()
            .or(self.raw.client_file.as_deref())
    }

    /// Depot path, falling back to the depot file the server reported
    pub fn resolved_depot_path(&self) -> Option<&str> {
        self.depot_path
            .as_deref()
            .or(self.raw.depot_file.as_deref())
    }

    /// Path used to address the record in a status query
    pub fn query_path(&self) -> &str {
        self.display_name()
    }

    /// Path passed to `command` for this record
    ///
    /// Adding needs a file on disk, so it always uses the local path.
    pub fn command_path(&self, command: P4Command) -> Option<&str> {
        match command {
            P4Command::Add => self.resolved_local_path(),
            _ => Some(self.query_path()),
        }
    }

    /// Re-query the server for this record alone
    pub fn refresh(&mut self, runner: &CommandRunner<'_>, diagnostics: &Diagnostics) -> Result<()> {
        let target = self.query_path().to_string();
        let lines = runner.run(P4Command::Fstat, std::slice::from_ref(&target))?;
        if let Some(err) = classify_failure(&lines, &runner.binary()) {
            return Err(err.into());
        }

        let case_insensitive = CURRENT_PLATFORM.case_insensitive_paths;
        let mut matched = None;
        for entry in parse_status_response(&lines) {
            if !self.matches(&entry, case_insensitive) {
                return Err(Error::UnmatchedResponse {
                    path: entry.path().unwrap_or_default().to_string(),
                });
            }
            matched = Some(entry);
        }

        match matched {
            Some(entry) => self.apply(&entry),
            None => {
                diagnostics.error(format!("No status returned for {target}"), None, true);
            }
        }
        Ok(())
    }

    /// Replace raw fields and status from one response entry
    pub(crate) fn apply(&mut self, entry: &StatusEntry) {
        let raw = RawFields::from_entry(entry);
        let (rule, status) = status::deduce_with_rule(&raw);
        if status == FileStatus::Invalid {
            warn!(
                "Unexpected status fields for {}: {:?}",
                self.display_name(),
                raw
            );
        } else {
            debug!("{} is {} (rule {})", self.display_name(), status, rule);
        }
        self.raw = raw;
        self.status = status;
    }

    /// Whether a response entry describes this record
    pub fn matches(&self, entry: &StatusEntry, case_insensitive: bool) -> bool {
        let same = |ours: Option<&str>, theirs: Option<&str>| match (ours, theirs) {
            (Some(ours), Some(theirs)) => paths_equal(ours, theirs, case_insensitive),
            _ => false,
        };

        match entry {
            StatusEntry::Fields(_) => {
                same(self.local_path(), entry.field("clientFile"))
                    || same(self.depot_path(), entry.field("depotFile"))
            }
            StatusEntry::NoSuchFile { path } | StatusEntry::NotInClientView { path } => {
                same(self.local_path(), Some(path)) || same(self.depot_path(), Some(path))
            }
        }
    }

    /// Whether the local path lies under the workspace root
    pub fn is_under_root(&self, root: &Path, diagnostics: &Diagnostics, silent: bool) -> bool {
        let Some(local) = self.resolved_local_path() else {
            return diagnostics.error(
                format!("{} has no local path in the workspace", self.display_name()),
                None,
                silent,
            );
        };

        if is_under_root(
            Path::new(local),
            root,
            CURRENT_PLATFORM.case_insensitive_paths,
        ) {
            diagnostics.log(format!("{local} is under workspace root {}", root.display()));
            return true;
        }

        diagnostics.error(
            format!("{local} is outside workspace root {}", root.display()),
            Some(&root_remediation(root)),
            silent,
        )
    }

    pub fn is_in_client_view(&self, diagnostics: &Diagnostics, silent: bool) -> bool {
        if !self.raw.not_in_client_view {
            return true;
        }
        diagnostics.error(
            format!("{} is not in the client view", self.display_name()),
            Some("Add the file's folder to the workspace mapping."),
            silent,
        )
    }

    pub fn is_free_of_other_checkouts(&self, diagnostics: &Diagnostics, silent: bool) -> bool {
        if self.status != FileStatus::CheckedOutByOther {
            return true;
        }
        diagnostics.error(
            format!(
                "{} is checked out by {}",
                self.display_name(),
                self.checkout_owners()
            ),
            Some("Ask them to submit or revert the file first."),
            silent,
        )
    }

    pub fn is_not_marked_for_delete(&self, diagnostics: &Diagnostics, silent: bool) -> bool {
        if self.status != FileStatus::MarkedForDelete {
            return true;
        }
        diagnostics.error(
            format!("{} is marked for delete", self.display_name()),
            Some("Revert the pending delete before modifying the file."),
            silent,
        )
    }

    /// Comma-separated owners of other users' checkouts
    pub fn checkout_owners(&self) -> String {
        if self.raw.other_checkouts.is_empty() {
            return "another user".to_string();
        }
        self.raw
            .other_checkouts
            .iter()
            .map(|checkout| checkout.owner.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) fn root_remediation(root: &Path) -> String {
    format!(
        "Move the file under {} or switch to the workspace that maps it.",
        root.display()
    )
}
