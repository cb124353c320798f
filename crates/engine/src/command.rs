//! Typed command registry
//!
//! The core contract uses exactly five client commands. Each maps statically
//! to its argument template, so an unsupported command cannot be expressed
//! except through [`P4Command::parse`], which rejects it.

use crate::{Error, Result};
use std::fmt;

/// Program name every command line starts with
pub const VCS_PREFIX: &str = "p4";

/// Client commands used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum P4Command {
    /// Identity / reachability query
    Info,
    /// Per-file status query
    Fstat,
    /// Mark files for add
    Add,
    /// Forced sync to head
    SyncForce,
    /// Open files for edit
    Edit,
}

impl P4Command {
    /// Every registered command
    pub const ALL: [Self; 5] = [Self::Info, Self::Fstat, Self::Add, Self::SyncForce, Self::Edit];

    /// Client sub-command name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Fstat => "fstat",
            Self::Add => "add",
            Self::SyncForce => "sync",
            Self::Edit => "edit",
        }
    }

    /// Argument template placed before any file arguments
    pub const fn template(self) -> &'static [&'static str] {
        match self {
            Self::Info => &["info"],
            Self::Fstat => &["fstat"],
            Self::Add => &["add"],
            Self::SyncForce => &["sync", "-f"],
            Self::Edit => &["edit"],
        }
    }

    /// Whether the command changes server or workspace state
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Add | Self::SyncForce | Self::Edit)
    }

    /// Whether the command operates on a file list
    pub const fn takes_files(self) -> bool {
        !matches!(self, Self::Info)
    }

    /// Look up a command by its sub-command name
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| Error::InvalidCommand(format!("unsupported command '{name}'")))
    }

    /// Full argument list for this command applied to `files`
    pub fn invocation(self, files: &[String]) -> Vec<String> {
        let template = self.template();
        let mut args = Vec::with_capacity(template.len() + files.len());
        args.extend(template.iter().map(|arg| (*arg).to_string()));
        if self.takes_files() {
            args.extend(files.iter().cloned());
        }
        args
    }
}

impl fmt::Display for P4Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{VCS_PREFIX} {}", self.template().join(" "))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        for command in P4Command::ALL {
            assert_eq!(P4Command::parse(command.name()).unwrap(), command);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = P4Command::parse("shelve").unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(_)));
    }

    #[test]
    fn test_sync_is_forced() {
        let args = P4Command::SyncForce.invocation(&["/ws/a.fbx".to_string()]);
        assert_eq!(args, vec!["sync", "-f", "/ws/a.fbx"]);
    }

    #[test]
    fn test_info_ignores_files() {
        let args = P4Command::Info.invocation(&["/ws/a.fbx".to_string()]);
        assert_eq!(args, vec!["info"]);
    }

    #[test]
    fn test_only_add_sync_edit_mutate() {
        let mutating: Vec<_> = P4Command::ALL
            .into_iter()
            .filter(|c| c.is_mutating())
            .collect();
        assert_eq!(
            mutating,
            vec![P4Command::Add, P4Command::SyncForce, P4Command::Edit]
        );
    }

    #[test]
    fn test_display_includes_prefix() {
        assert_eq!(P4Command::SyncForce.to_string(), "p4 sync -f");
    }
}
