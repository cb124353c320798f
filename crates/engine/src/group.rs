//! Groups of file records
//!
//! A [`FileRecordGroup`] splits its records into those addressed by local
//! path and those addressed only by depot path. Each subset is queried and
//! commanded in size-bounded batches, and every response entry must match a
//! record in the subset that asked for it.

use crate::batch::batch_paths;
use crate::command::P4Command;
use crate::parser::{StatusEntry, parse_status_response};
use crate::record::{FileRecord, root_remediation};
use crate::runner::CommandRunner;
use crate::session::classify_failure;
use crate::status::FileStatus;
use crate::{Error, Result};
use indexmap::IndexMap;
use p4gate_core::Diagnostics;
use p4gate_core::path::fold;
use p4gate_core::platform::CURRENT_PLATFORM;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// Which path a record is addressed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subset {
    Local,
    Depot,
}

impl Subset {
    fn of(record: &FileRecord) -> Self {
        if record.local_path().is_some() {
            Self::Local
        } else {
            Self::Depot
        }
    }
}

/// Ordered collection of file records with path lookups
#[derive(Debug, Clone, Default)]
pub struct FileRecordGroup {
    records: Vec<FileRecord>,
    by_local: IndexMap<String, usize>,
    by_depot: IndexMap<String, usize>,
    case_insensitive: bool,
}

impl FileRecordGroup {
    /// Build a group using the current platform's case rules
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self::with_case_rules(records, CURRENT_PLATFORM.case_insensitive_paths)
    }

    /// Build a group, dropping records whose path is already present
    pub fn with_case_rules(records: Vec<FileRecord>, case_insensitive: bool) -> Self {
        let mut group = Self {
            case_insensitive,
            ..Self::default()
        };

        for record in records {
            let (map, key) = match (record.local_path(), record.depot_path()) {
                (Some(local), _) => (&mut group.by_local, fold(local, case_insensitive)),
                (None, Some(depot)) => (&mut group.by_depot, fold(depot, case_insensitive)),
                (None, None) => continue,
            };
            if map.contains_key(key.as_ref()) {
                debug!("Skipping duplicate {}", record.display_name());
                continue;
            }
            map.insert(key.into_owned(), group.records.len());
            group.records.push(record);
        }

        group
    }

    pub fn from_local_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(paths.into_iter().map(FileRecord::from_local).collect())
    }

    pub fn from_depot_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(paths.into_iter().map(FileRecord::from_depot).collect())
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_by_local(&self, path: &str) -> Option<&FileRecord> {
        self.index_of(Subset::Local, path)
            .map(|index| &self.records[index])
    }

    pub fn get_by_depot(&self, path: &str) -> Option<&FileRecord> {
        self.index_of(Subset::Depot, path)
            .map(|index| &self.records[index])
    }

    /// Paths of records addressed by local path, in group order
    pub fn local_paths(&self) -> Vec<String> {
        self.subset_paths(Subset::Local)
    }

    /// Paths of records addressed only by depot path, in group order
    pub fn depot_paths(&self) -> Vec<String> {
        self.subset_paths(Subset::Depot)
    }

    fn map(&self, subset: Subset) -> &IndexMap<String, usize> {
        match subset {
            Subset::Local => &self.by_local,
            Subset::Depot => &self.by_depot,
        }
    }

    fn index_of(&self, subset: Subset, path: &str) -> Option<usize> {
        self.map(subset)
            .get(fold(path, self.case_insensitive).as_ref())
            .copied()
    }

    fn subset_paths(&self, subset: Subset) -> Vec<String> {
        self.map(subset)
            .values()
            .map(|&index| self.records[index].query_path().to_string())
            .collect()
    }

    /// Index of the record an entry from `subset`'s query describes
    fn match_entry(&self, subset: Subset, entry: &StatusEntry) -> Option<usize> {
        let key = match (entry, subset) {
            (StatusEntry::Fields(_), Subset::Local) => entry.field("clientFile"),
            (StatusEntry::Fields(_), Subset::Depot) => entry.field("depotFile"),
            (StatusEntry::NoSuchFile { path } | StatusEntry::NotInClientView { path }, _) => {
                Some(path.as_str())
            }
        }?;
        self.index_of(subset, key)
    }

    /// Refresh every record with batched status queries
    ///
    /// Nothing is updated unless every response entry matched a record.
    pub fn issue_query(&mut self, runner: &CommandRunner<'_>, diagnostics: &Diagnostics) -> Result<()> {
        let max_len = runner.config().max_batch_length;
        let binary = runner.binary();
        let mut updates: Vec<(usize, StatusEntry)> = Vec::new();

        for subset in [Subset::Local, Subset::Depot] {
            for batch in batch_paths(&self.subset_paths(subset), max_len)? {
                let lines = runner.run(P4Command::Fstat, batch.paths())?;
                if let Some(err) = classify_failure(&lines, &binary) {
                    return Err(err.into());
                }

                for entry in parse_status_response(&lines) {
                    let index = self.match_entry(subset, &entry).ok_or_else(|| {
                        Error::UnmatchedResponse {
                            path: entry.path().unwrap_or("<no path>").to_string(),
                        }
                    })?;
                    updates.push((index, entry));
                }
            }
        }

        let mut refreshed = vec![false; self.records.len()];
        for (index, entry) in &updates {
            self.records[*index].apply(entry);
            refreshed[*index] = true;
        }

        for (record, _) in self.records.iter().zip(&refreshed).filter(|(_, seen)| !**seen) {
            diagnostics.error(
                format!("No status returned for {}", record.display_name()),
                None,
                true,
            );
        }

        Ok(())
    }

    /// Records whose status passes the include and exclude filters
    pub fn select(
        &self,
        include: Option<&[FileStatus]>,
        exclude: Option<&[FileStatus]>,
    ) -> Vec<&FileRecord> {
        self.records
            .iter()
            .filter(|record| status_selected(record.status(), include, exclude))
            .collect()
    }

    /// Run a mutating command on the selected records in batches
    ///
    /// Returns the combined output; selecting nothing issues nothing.
    pub fn issue_command(
        &self,
        runner: &CommandRunner<'_>,
        command: P4Command,
        include: Option<&[FileStatus]>,
        exclude: Option<&[FileStatus]>,
    ) -> Result<Vec<String>> {
        let selected = self.select(include, exclude);
        let max_len = runner.config().max_batch_length;
        let binary = runner.binary();
        let mut output = Vec::new();

        for subset in [Subset::Local, Subset::Depot] {
            let paths = selected
                .iter()
                .filter(|record| Subset::of(record) == subset)
                .map(|record| {
                    record
                        .command_path(command)
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::InvalidCommand(format!(
                                "{command} needs a local path for {}",
                                record.display_name()
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            for batch in batch_paths(&paths, max_len)? {
                let lines = runner.run(command, batch.paths())?;
                if let Some(err) = classify_failure(&lines, &binary) {
                    return Err(err.into());
                }
                output.extend(lines);
            }
        }

        Ok(output)
    }

    /// Check that every record with a local path is under `root`
    ///
    /// Reports one error naming every offending file.
    pub fn all_under_root(&self, root: &Path, diagnostics: &Diagnostics, silent: bool) -> bool {
        let offenders: Vec<&str> = self
            .records
            .iter()
            .filter(|record| record.local_path().is_some())
            .filter(|record| !record.is_under_root(root, diagnostics, true))
            .map(FileRecord::display_name)
            .collect();

        if offenders.is_empty() {
            return true;
        }

        diagnostics.error(
            elaborate(
                &format!("Files outside workspace root {}:", root.display()),
                &offenders,
            ),
            Some(&root_remediation(root)),
            silent,
        )
    }

    /// Check view, other-user checkouts and pending deletes for every record
    ///
    /// Reports one error listing all offenders.
    pub fn check_preconditions(&self, diagnostics: &Diagnostics, silent: bool) -> bool {
        let mut not_in_view = Vec::new();
        let mut checked_out = Vec::new();
        let mut marked_for_delete = Vec::new();

        for record in &self.records {
            if !record.is_in_client_view(diagnostics, true) {
                not_in_view.push(record.display_name().to_string());
            }
            if !record.is_free_of_other_checkouts(diagnostics, true) {
                checked_out.push(format!(
                    "{} ({})",
                    record.display_name(),
                    record.checkout_owners()
                ));
            }
            if !record.is_not_marked_for_delete(diagnostics, true) {
                marked_for_delete.push(record.display_name().to_string());
            }
        }

        let mut message = String::new();
        for (heading, offenders) in [
            ("Not in client view:", &not_in_view),
            ("Checked out by another user:", &checked_out),
            ("Marked for delete:", &marked_for_delete),
        ] {
            if !offenders.is_empty() {
                if !message.is_empty() {
                    message.push('\n');
                }
                message.push_str(&elaborate(heading, offenders));
            }
        }

        if message.is_empty() {
            return true;
        }

        diagnostics.error(
            message,
            Some("Resolve the listed files in Perforce and try again."),
            silent,
        )
    }
}

fn status_selected(
    status: FileStatus,
    include: Option<&[FileStatus]>,
    exclude: Option<&[FileStatus]>,
) -> bool {
    include.is_none_or(|include| include.contains(&status))
        && exclude.is_none_or(|exclude| !exclude.contains(&status))
}

/// Heading followed by one indented line per file
fn elaborate<S: AsRef<str>>(heading: &str, files: &[S]) -> String {
    let mut message = heading.to_string();
    for file in files {
        let _ = write!(message, "\n  {}", file.as_ref());
    }
    message
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::runner::{ExecOutcome, ProcessExecutor, ProcessOutput};
    use p4gate_config::ConnectionConfig;
    use p4gate_core::{MemoryReporter, Severity};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    /// Replays canned outputs in order and records every invocation
    #[derive(Default)]
    struct Replay {
        outputs: RefCell<VecDeque<String>>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl Replay {
        fn new(outputs: &[&str]) -> Self {
            Self {
                outputs: RefCell::new(outputs.iter().map(ToString::to_string).collect()),
                calls: RefCell::default(),
            }
        }
    }

    impl ProcessExecutor for Replay {
        fn execute(&self, _: &Path, args: &[String], _: Duration) -> io::Result<ExecOutcome> {
            self.calls.borrow_mut().push(args.to_vec());
            let stdout = self.outputs.borrow_mut().pop_front().unwrap_or_default();
            Ok(ExecOutcome::Completed(ProcessOutput {
                stdout,
                exit_code: Some(0),
            }))
        }
    }

    fn config(max_batch_length: usize) -> ConnectionConfig {
        ConnectionConfig {
            binary: Some(std::env::current_exe().unwrap()),
            max_batch_length,
            ..ConnectionConfig::default()
        }
    }

    fn diagnostics() -> (Arc<MemoryReporter>, Diagnostics) {
        let reporter = Arc::new(MemoryReporter::new());
        let diagnostics = Diagnostics::new(reporter.clone());
        (reporter, diagnostics)
    }

    fn set_raw(record: &mut FileRecord, lines: &[&str]) {
        record.apply(&parse_status_response(lines).remove(0));
    }

    fn mixed_group() -> FileRecordGroup {
        FileRecordGroup::with_case_rules(
            vec![
                FileRecord::from_local("/ws/a.fbx"),
                FileRecord::from_depot("//depot/b.fbx"),
                FileRecord::from_local("/ws/c.fbx"),
                FileRecord::from_local("/ws/a.fbx"),
            ],
            false,
        )
    }

    #[test]
    fn test_every_record_in_exactly_one_map() {
        let group = mixed_group();

        assert_eq!(group.len(), 3);
        assert_eq!(group.local_paths(), vec!["/ws/a.fbx", "/ws/c.fbx"]);
        assert_eq!(group.depot_paths(), vec!["//depot/b.fbx"]);
        assert!(group.get_by_local("/ws/c.fbx").is_some());
        assert!(group.get_by_depot("//depot/b.fbx").is_some());
        assert!(group.get_by_local("//depot/b.fbx").is_none());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let group =
            FileRecordGroup::with_case_rules(vec![FileRecord::from_local("C:\\WS\\A.fbx")], true);
        assert!(group.get_by_local("c:\\ws\\a.fbx").is_some());

        let group =
            FileRecordGroup::with_case_rules(vec![FileRecord::from_local("C:\\WS\\A.fbx")], false);
        assert!(group.get_by_local("c:\\ws\\a.fbx").is_none());
    }

    #[test]
    fn test_issue_query_matches_each_subset() {
        let mut group = mixed_group();
        let config = config(1000);
        let replay = Replay::new(&[
            "... clientFile /ws/a.fbx\n... isMapped\n... headRev 2\n... haveRev 2\n\n\
             /ws/c.fbx - no such file(s).\n",
            "... depotFile //depot/b.fbx\n... clientFile /ws/b.fbx\n... isMapped\n... action edit\n",
        ]);
        let runner = CommandRunner::new(&config, &replay);
        let (reporter, diagnostics) = diagnostics();

        group.issue_query(&runner, &diagnostics).unwrap();

        let calls = replay.calls.borrow();
        assert_eq!(calls[0], vec!["fstat", "/ws/a.fbx", "/ws/c.fbx"]);
        assert_eq!(calls[1], vec!["fstat", "//depot/b.fbx"]);
        assert_eq!(
            group.get_by_local("/ws/a.fbx").unwrap().status(),
            FileStatus::LatestRevision
        );
        assert_eq!(
            group.get_by_local("/ws/c.fbx").unwrap().status(),
            FileStatus::NotAdded
        );
        assert_eq!(
            group.get_by_depot("//depot/b.fbx").unwrap().status(),
            FileStatus::CheckedOutByMe
        );
        assert_eq!(reporter.count(Severity::Error), 0);
    }

    #[test]
    fn test_unmatched_entry_aborts_without_updates() {
        let mut group = mixed_group();
        let config = config(1000);
        let replay = Replay::new(&[
            "... clientFile /ws/a.fbx\n... isMapped\n... action edit\n\n\
             ... clientFile /ws/zzz.fbx\n... isMapped\n",
        ]);
        let runner = CommandRunner::new(&config, &replay);
        let (_, diagnostics) = diagnostics();

        let err = group.issue_query(&runner, &diagnostics).unwrap_err();

        assert!(matches!(err, Error::UnmatchedResponse { ref path } if path == "/ws/zzz.fbx"));
        assert_eq!(err.severity(), Severity::Critical);
        assert_eq!(
            group.get_by_local("/ws/a.fbx").unwrap().status(),
            FileStatus::Unknown
        );
    }

    #[test]
    fn test_missing_entry_is_silent_error() {
        let mut group = FileRecordGroup::with_case_rules(
            vec![
                FileRecord::from_local("/ws/a.fbx"),
                FileRecord::from_local("/ws/b.fbx"),
            ],
            false,
        );
        let config = config(1000);
        let replay = Replay::new(&["... clientFile /ws/a.fbx\n... isMapped\n... action add\n"]);
        let runner = CommandRunner::new(&config, &replay);
        let (reporter, diagnostics) = diagnostics();

        group.issue_query(&runner, &diagnostics).unwrap();

        let errors: Vec<_> = reporter
            .entries()
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].silent);
        assert!(errors[0].message.contains("/ws/b.fbx"));
        assert_eq!(
            group.get_by_local("/ws/b.fbx").unwrap().status(),
            FileStatus::Unknown
        );
    }

    #[test]
    fn test_query_is_batched_by_length() {
        let paths: Vec<String> = (0..10).map(|i| format!("/ws/{i}.fbx")).collect();
        let mut group = FileRecordGroup::with_case_rules(
            paths.iter().cloned().map(FileRecord::from_local).collect(),
            false,
        );
        // each quoted path is 11 characters, so three fit in 38
        let config = config(38);
        let replay = Replay::default();
        let runner = CommandRunner::new(&config, &replay);
        let (_, diagnostics) = diagnostics();

        group.issue_query(&runner, &diagnostics).unwrap();

        let calls = replay.calls.borrow();
        assert_eq!(calls.len(), 4);
        let sent: Vec<String> = calls.iter().flat_map(|c| c[1..].to_vec()).collect();
        assert_eq!(sent, paths);
    }

    #[test]
    fn test_issue_command_filters_by_status() {
        let mut group = FileRecordGroup::with_case_rules(
            vec![
                FileRecord::from_local("/ws/new.fbx"),
                FileRecord::from_local("/ws/mine.fbx"),
                FileRecord::from_local("/ws/old.fbx"),
            ],
            false,
        );
        group.records[0].apply(&StatusEntry::NoSuchFile {
            path: "/ws/new.fbx".into(),
        });
        set_raw(
            &mut group.records[1],
            &["... clientFile /ws/mine.fbx", "... isMapped", "... action edit"],
        );
        set_raw(
            &mut group.records[2],
            &["... clientFile /ws/old.fbx", "... isMapped", "... headRev 3", "... haveRev 1"],
        );

        let config = config(1000);
        let replay = Replay::default();
        let runner = CommandRunner::new(&config, &replay);

        group
            .issue_command(
                &runner,
                P4Command::Edit,
                None,
                Some(&[
                    FileStatus::NotAdded,
                    FileStatus::MarkedForAdd,
                    FileStatus::CheckedOutByMe,
                ]),
            )
            .unwrap();
        group
            .issue_command(
                &runner,
                P4Command::Add,
                Some(&[FileStatus::MarkedForAdd]),
                None,
            )
            .unwrap();

        let calls = replay.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["edit", "/ws/old.fbx"]);
    }

    #[test]
    fn test_preconditions_name_every_offender() {
        let mut group = FileRecordGroup::with_case_rules(
            vec![
                FileRecord::from_local("/ws/a.fbx"),
                FileRecord::from_local("/ws/b.fbx"),
                FileRecord::from_local("/ws/c.fbx"),
            ],
            false,
        );
        group.records[0].apply(&StatusEntry::NotInClientView {
            path: "/ws/a.fbx".into(),
        });
        set_raw(
            &mut group.records[1],
            &[
                "... clientFile /ws/b.fbx",
                "... isMapped",
                "... headRev 1",
                "... otherOpen0 rigger@rig-ws",
                "... otherOpen 1",
            ],
        );
        set_raw(
            &mut group.records[2],
            &["... clientFile /ws/c.fbx", "... isMapped", "... headAction add", "... action delete"],
        );
        let (reporter, diagnostics) = diagnostics();

        assert!(!group.check_preconditions(&diagnostics, false));

        let loud: Vec<_> = reporter
            .entries()
            .into_iter()
            .filter(|d| d.severity == Severity::Error && !d.silent)
            .collect();
        assert_eq!(loud.len(), 1);
        for name in ["/ws/a.fbx", "/ws/b.fbx (rigger@rig-ws)", "/ws/c.fbx"] {
            assert!(loud[0].message.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_all_under_root_aggregates() {
        let group = FileRecordGroup::with_case_rules(
            vec![
                FileRecord::from_local("/ws/a.fbx"),
                FileRecord::from_local("/tmp/b.fbx"),
                FileRecord::from_local("/home/c.fbx"),
                FileRecord::from_depot("//depot/d.fbx"),
            ],
            false,
        );
        let (reporter, diagnostics) = diagnostics();

        assert!(!group.all_under_root(Path::new("/ws"), &diagnostics, false));

        let loud: Vec<_> = reporter
            .entries()
            .into_iter()
            .filter(|d| d.is_interruptive())
            .collect();
        assert_eq!(loud.len(), 1);
        assert!(loud[0].message.contains("/tmp/b.fbx"));
        assert!(loud[0].message.contains("/home/c.fbx"));
        assert!(!loud[0].message.contains("/ws/a.fbx"));
    }
}
