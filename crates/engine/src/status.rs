//! File lifecycle status
//!
//! [`deduce`] maps one file's raw status fields to a [`FileStatus`] by
//! evaluating ordered rules; the first rule that matches wins because several
//! field combinations can hold at once.

use crate::parser::StatusEntry;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of a tracked file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    /// Never refreshed
    #[default]
    Unknown,
    NotAdded,
    MarkedForAdd,
    MarkedForDelete,
    CheckedOutByMe,
    CheckedOutByOther,
    LatestRevision,
    NotLatestRevision,
    /// Field combination no rule accounts for
    Invalid,
}

impl FileStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::NotAdded => "NOT_ADDED",
            Self::MarkedForAdd => "MARKED_FOR_ADD",
            Self::MarkedForDelete => "MARKED_FOR_DELETE",
            Self::CheckedOutByMe => "CHECKED_OUT_BY_ME",
            Self::CheckedOutByOther => "CHECKED_OUT_BY_OTHER",
            Self::LatestRevision => "LATEST_REVISION",
            Self::NotLatestRevision => "NOT_LATEST_REVISION",
            Self::Invalid => "INVALID",
        }
    }

    /// Whether the file is ready to be modified locally
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::MarkedForAdd | Self::CheckedOutByMe)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Another user's pending action on a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherCheckout {
    pub owner: String,
    pub action: Option<String>,
    pub change: Option<String>,
}

/// Raw per-file fields from the last status query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFields {
    pub depot_file: Option<String>,
    pub client_file: Option<String>,
    pub is_mapped: bool,
    pub not_in_client_view: bool,
    /// The server has no record of the file
    pub no_such_file: bool,
    pub head_action: Option<String>,
    pub head_type: Option<String>,
    pub head_rev: Option<u32>,
    pub head_change: Option<String>,
    pub have_rev: Option<u32>,
    pub other_checkouts: Vec<OtherCheckout>,
    pub other_open_count: u32,
    pub action: Option<String>,
    pub change: Option<String>,
    pub file_type: Option<String>,
    pub action_owner: Option<String>,
    pub work_rev: Option<u32>,
}

impl RawFields {
    /// Build the full field set for one response entry
    pub fn from_entry(entry: &StatusEntry) -> Self {
        match entry {
            StatusEntry::NoSuchFile { path } => Self {
                client_file: Some(path.clone()),
                no_such_file: true,
                ..Self::default()
            },
            StatusEntry::NotInClientView { path } => Self {
                client_file: Some(path.clone()),
                not_in_client_view: true,
                ..Self::default()
            },
            StatusEntry::Fields(_) => {
                let text = |key: &str| entry.field(key).map(ToString::to_string);
                let number = |key: &str| entry.field(key).and_then(|v| v.trim().parse().ok());

                let mut other_checkouts = Vec::new();
                let mut index = 0;
                while let Some(owner) = entry.field(&format!("otherOpen{index}")) {
                    other_checkouts.push(OtherCheckout {
                        owner: owner.to_string(),
                        action: text(&format!("otherAction{index}")),
                        change: text(&format!("otherChange{index}")),
                    });
                    index += 1;
                }

                Self {
                    depot_file: text("depotFile"),
                    client_file: text("clientFile"),
                    is_mapped: entry.field("isMapped").is_some(),
                    not_in_client_view: false,
                    no_such_file: false,
                    head_action: text("headAction"),
                    head_type: text("headType"),
                    head_rev: number("headRev"),
                    head_change: text("headChange"),
                    have_rev: number("haveRev"),
                    other_open_count: number("otherOpen")
                        .unwrap_or(u32::try_from(other_checkouts.len()).unwrap_or(u32::MAX)),
                    other_checkouts,
                    action: text("action"),
                    change: text("change"),
                    file_type: text("type"),
                    action_owner: text("actionOwner"),
                    work_rev: number("workRev"),
                }
            }
        }
    }

    /// Whether another user holds an open action on the file
    pub fn opened_by_other(&self) -> bool {
        self.other_open_count > 0 || !self.other_checkouts.is_empty()
    }
}

/// Deduce the lifecycle status from raw fields
pub fn deduce(raw: &RawFields) -> FileStatus {
    deduce_with_rule(raw).1
}

/// Deduce the status along with the number of the rule that decided it
pub fn deduce_with_rule(raw: &RawFields) -> (u8, FileStatus) {
    let head_action = raw.head_action.as_deref();
    let action = raw.action.as_deref();

    if head_action == Some("delete") && action == Some("add") {
        return (1, FileStatus::MarkedForAdd);
    }
    if !raw.is_mapped || matches!(head_action, Some("move/delete" | "delete")) {
        return (2, FileStatus::NotAdded);
    }
    if head_action == Some("add") && action == Some("delete") {
        return (3, FileStatus::MarkedForDelete);
    }
    if action == Some("add") {
        return (4, FileStatus::MarkedForAdd);
    }
    if action == Some("edit") {
        return (5, FileStatus::CheckedOutByMe);
    }
    if raw.opened_by_other() {
        return (6, FileStatus::CheckedOutByOther);
    }
    match raw.head_rev {
        Some(head) if raw.have_rev == Some(head) => (7, FileStatus::LatestRevision),
        Some(_) => (8, FileStatus::NotLatestRevision),
        None => (9, FileStatus::Invalid),
    }
}
