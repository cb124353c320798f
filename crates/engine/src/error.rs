//! Error types for p4gate-engine
//!
//! Every error knows its [`Severity`], so callers apply the three-tier policy
//! (log / recoverable error / critical termination) without matching on
//! message text.

use p4gate_core::Severity;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// The resolved client binary does not exist
    #[error("Perforce client not found at {}", path.display())]
    ToolMissing { path: PathBuf },

    /// The client could not be started or exited abnormally
    #[error("`{command}` failed: {message}")]
    ToolError { command: String, message: String },

    /// The client did not finish in time and was killed
    #[error("`{command}` timed out after {seconds} seconds")]
    Timeout { command: String, seconds: u64 },

    /// Identity/session failure reported by the server or client
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A status record came back for a file nobody asked about
    #[error("Status response for '{path}' matches no requested file")]
    UnmatchedResponse { path: String },

    /// A file record was built without any path
    #[error("A file record needs a depot path or a local path")]
    MissingIdentity,

    /// Command string or name outside the supported command surface
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A single path cannot fit into one batch
    #[error("Path exceeds the maximum command length of {max} characters: {path}")]
    PathTooLong { path: String, max: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from shared crates
    #[error(transparent)]
    Core(#[from] p4gate_core::Error),
}

impl Error {
    /// Severity under the diagnostics taxonomy
    pub fn severity(&self) -> Severity {
        match self {
            Self::ToolMissing { .. }
            | Self::ToolError { .. }
            | Self::Timeout { .. }
            | Self::Io(_)
            | Self::Core(_) => Severity::Error,
            Self::Session(err) => err.severity(),
            Self::UnmatchedResponse { .. }
            | Self::MissingIdentity
            | Self::InvalidCommand(_)
            | Self::PathTooLong { .. } => Severity::Critical,
        }
    }

    /// Human-actionable advice, when there is any
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::ToolMissing { .. } => Some(
                "Install the Perforce command-line client (p4) or set `binary` in the \
                 [connection] section of the config file."
                    .to_string(),
            ),
            Self::Timeout { .. } => Some(
                "Check that the Perforce server is reachable, or raise `timeoutSecs`.".to_string(),
            ),
            Self::Session(err) => err.remediation(),
            _ => None,
        }
    }
}

/// Failures recognised while establishing a server session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The configured workspace is unknown to the server
    #[error("Client unknown: the connection settings name a workspace the server does not know")]
    ClientUnknown,

    /// The client binary lacks execute permission
    #[error("Permission denied while running {}", binary.display())]
    PermissionDenied { binary: PathBuf },

    /// The client binary is missing or printed something unexpected
    #[error("Perforce client is not installed or not working: {output}")]
    ToolNotInstalled { output: String },

    /// The login ticket expired
    #[error("Your Perforce session has expired")]
    SessionExpired,

    /// Identity response parsed but lacks a required key
    #[error("Identity response is missing the '{key}' field")]
    MissingField { key: &'static str },

    /// Running the identity query itself failed
    #[error(transparent)]
    Tool(Box<Error>),
}

impl SessionError {
    /// Severity under the diagnostics taxonomy
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingField { .. } => Severity::Critical,
            Self::Tool(err) => err.severity(),
            _ => Severity::Error,
        }
    }

    /// Human-actionable advice, when there is any
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::ClientUnknown => Some(
                "Set `client` (and `overrideConnection = true`) in the config file, or fix \
                 P4CLIENT in your Perforce environment."
                    .to_string(),
            ),
            Self::PermissionDenied { binary } => Some(permission_remediation(binary)),
            Self::ToolNotInstalled { .. } => Some(
                "Install the Perforce command-line client (p4) and make sure it runs from a \
                 terminal."
                    .to_string(),
            ),
            Self::SessionExpired => Some("Run `p4 login` and try again.".to_string()),
            Self::MissingField { .. } => None,
            Self::Tool(err) => err.remediation(),
        }
    }
}

impl From<Error> for SessionError {
    fn from(err: Error) -> Self {
        match err {
            Error::Session(inner) => inner,
            other => Self::Tool(Box::new(other)),
        }
    }
}

#[cfg(unix)]
fn permission_remediation(binary: &std::path::Path) -> String {
    format!(
        "Make the client executable: chmod +x \"{}\"",
        binary.display()
    )
}

#[cfg(not(unix))]
fn permission_remediation(binary: &std::path::Path) -> String {
    format!(
        "Allow execution of \"{}\" (check its security properties and antivirus quarantine).",
        binary.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violations_are_critical() {
        assert_eq!(Error::MissingIdentity.severity(), Severity::Critical);
        assert_eq!(
            Error::UnmatchedResponse {
                path: "//depot/a".into()
            }
            .severity(),
            Severity::Critical
        );
        assert_eq!(
            Error::Session(SessionError::MissingField { key: "Client name" }).severity(),
            Severity::Critical
        );
    }

    #[test]
    fn test_tool_failures_are_recoverable() {
        let timeout = Error::Timeout {
            command: "p4 info".into(),
            seconds: 15,
        };
        assert_eq!(timeout.severity(), Severity::Error);
        assert!(timeout.remediation().is_some());
        assert_eq!(
            Error::Session(SessionError::SessionExpired).severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_session_error_from_engine_error_unwraps_session() {
        let err: SessionError = Error::Session(SessionError::ClientUnknown).into();
        assert!(matches!(err, SessionError::ClientUnknown));

        let err: SessionError = Error::ToolMissing {
            path: "/usr/local/bin/p4".into(),
        }
        .into();
        assert!(matches!(err, SessionError::Tool(_)));
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn test_permission_remediation_names_binary() {
        let err = SessionError::PermissionDenied {
            binary: "/Applications/p4v.app/Contents/Resources/p4".into(),
        };
        assert!(err.remediation().unwrap_or_default().contains("p4v.app"));
    }
}
