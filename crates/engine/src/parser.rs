//! Client output parsing
//!
//! Status responses are blocks of `... key value` lines separated by blank
//! lines, interleaved with one-line sentinels for files the server cannot
//! describe. Identity responses are flat `Key Name: value` lines.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// Workspace name not known to the server
pub const CLIENT_UNKNOWN: &str = "Client unknown.";

/// Client binary not executable
pub const PERMISSION_DENIED: &str = "Permission denied";

/// Client binary not found by the shell
pub const NOT_RECOGNIZED: &str = "is not recognized";

/// Login ticket expired
pub const SESSION_EXPIRED: &str = "session has expired";

/// File unknown to the server
pub const NO_SUCH_FILE: &str = " - no such file(s).";

/// File outside the workspace mapping
pub const NOT_IN_CLIENT_VIEW: &str = " - file(s) not in client view.";

/// Prefix the client puts in front of tagged output
const TAG_PREFIX: &str = "... ";

static NO_SUCH_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+) - no such file\(s\)\.$").expect("Invalid no-such-file regex")
});

static NOT_IN_VIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+) - file\(s\) not in client view\.$")
        .expect("Invalid not-in-view regex")
});

/// One file's worth of a status response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEntry {
    /// Tagged fields in response order
    Fields(IndexMap<String, String>),
    /// `<path> - no such file(s).`
    NoSuchFile { path: String },
    /// `<path> - file(s) not in client view.`
    NotInClientView { path: String },
}

impl StatusEntry {
    /// Path the entry identifies when matched against depot or local paths
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields
                .get("clientFile")
                .or_else(|| fields.get("depotFile"))
                .map(String::as_str),
            Self::NoSuchFile { path } | Self::NotInClientView { path } => Some(path),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields.get(key).map(String::as_str),
            _ => None,
        }
    }
}

/// Whether the output carries a sentinel the engine knows how to interpret
pub fn contains_sentinel(output: &str) -> bool {
    [
        NO_SUCH_FILE,
        NOT_IN_CLIENT_VIEW,
        CLIENT_UNKNOWN,
        PERMISSION_DENIED,
        NOT_RECOGNIZED,
    ]
    .iter()
    .any(|sentinel| output.contains(sentinel))
}

/// Split a status response into per-file entries
pub fn parse_status_response<S: AsRef<str>>(lines: &[S]) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut current: IndexMap<String, String> = IndexMap::new();

    for line in lines {
        let line = line.as_ref().trim_end();

        if line.trim().is_empty() {
            flush(&mut current, &mut entries);
            continue;
        }

        if let Some(caps) = NO_SUCH_FILE_RE.captures(line) {
            flush(&mut current, &mut entries);
            entries.push(StatusEntry::NoSuchFile {
                path: caps["path"].to_string(),
            });
            continue;
        }

        if let Some(caps) = NOT_IN_VIEW_RE.captures(line) {
            flush(&mut current, &mut entries);
            entries.push(StatusEntry::NotInClientView {
                path: caps["path"].to_string(),
            });
            continue;
        }

        let tagged = line.strip_prefix(TAG_PREFIX).unwrap_or(line);
        let (key, value) = tagged.split_once(' ').unwrap_or((tagged, ""));
        if key.is_empty() {
            continue;
        }
        current.insert(key.to_string(), value.to_string());
    }

    flush(&mut current, &mut entries);
    entries
}

fn flush(current: &mut IndexMap<String, String>, entries: &mut Vec<StatusEntry>) {
    if !current.is_empty() {
        entries.push(StatusEntry::Fields(std::mem::take(current)));
    }
}

/// Split one identity line into key and value
pub fn parse_info_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(": ")?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Parse a whole identity response, skipping lines that are not key/value
pub fn parse_info_response<S: AsRef<str>>(lines: &[S]) -> IndexMap<String, String> {
    lines
        .iter()
        .filter_map(|line| parse_info_line(line.as_ref()))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FSTAT: &str = "\
... depotFile //depot/art/hero.fbx
... clientFile /ws/art/hero.fbx
... isMapped
... headAction edit
... headRev 4
... haveRev 3

... depotFile //depot/art/prop.fbx
... clientFile /ws/art/prop.fbx
... action edit
/ws/art/new.fbx - no such file(s).
//depot/other/x.fbx - file(s) not in client view.
";

    #[test]
    fn test_parse_blocks_and_sentinels() {
        let lines: Vec<&str> = FSTAT.lines().collect();
        let entries = parse_status_response(&lines);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].field("headRev"), Some("4"));
        assert_eq!(entries[0].field("isMapped"), Some(""));
        assert_eq!(entries[0].path(), Some("/ws/art/hero.fbx"));
        assert_eq!(entries[1].field("action"), Some("edit"));
        assert_eq!(
            entries[2],
            StatusEntry::NoSuchFile {
                path: "/ws/art/new.fbx".into()
            }
        );
        assert_eq!(
            entries[3],
            StatusEntry::NotInClientView {
                path: "//depot/other/x.fbx".into()
            }
        );
    }

    #[test]
    fn test_value_keeps_inner_spaces() {
        let entries = parse_status_response(&["... clientFile /ws/my art/hero v2.fbx"]);
        assert_eq!(entries[0].field("clientFile"), Some("/ws/my art/hero v2.fbx"));
    }

    #[test]
    fn test_empty_response() {
        let entries = parse_status_response::<&str>(&[]);
        assert!(entries.is_empty());
        assert!(parse_status_response(&["", "  "]).is_empty());
    }

    #[test]
    fn test_contains_sentinel() {
        assert!(contains_sentinel("/ws/a - no such file(s).\n"));
        assert!(contains_sentinel("Client 'ws' unknown - use 'client' command.\nClient unknown.\n"));
        assert!(!contains_sentinel("Connect to server failed"));
    }

    #[test]
    fn test_parse_info() {
        let info = parse_info_response(&[
            "User name: artist",
            "Client name: artist-ws",
            "Client root: C:\\work\\ws",
            "Server address: ssl:p4:1666",
            "garbage line",
        ]);

        assert_eq!(info.get("User name").map(String::as_str), Some("artist"));
        assert_eq!(
            info.get("Client root").map(String::as_str),
            Some("C:\\work\\ws")
        );
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn test_info_line_requires_key() {
        assert_eq!(parse_info_line(": value"), None);
        assert_eq!(parse_info_line("no separator"), None);
        assert_eq!(
            parse_info_line("Server uptime: 12:03:44"),
            Some(("Server uptime", "12:03:44"))
        );
    }
}
