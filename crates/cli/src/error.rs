//! Error types for CLI commands
//!
//! Engine errors pass through unchanged so their severity and remediation
//! survive up to the entry point.

use p4gate_engine::Severity;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// Failure inside the checkout engine
    #[error(transparent)]
    Engine(#[from] p4gate_engine::Error),

    /// Configuration or logging setup error
    #[error(transparent)]
    Config(#[from] p4gate_core::Error),

    /// The checkout workflow finished without opening every file
    #[error("Checkout did not complete for {files} file(s)")]
    CheckoutIncomplete {
        /// Number of files that were requested
        files: usize,
    },

    /// Invalid path error
    #[error("Invalid path: {}", path.display())]
    InvalidPath {
        /// The invalid path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Output serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<p4gate_engine::SessionError> for CommandError {
    fn from(err: p4gate_engine::SessionError) -> Self {
        Self::Engine(err.into())
    }
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

impl CommandError {
    /// Severity under the diagnostics taxonomy
    pub fn severity(&self) -> Severity {
        match self {
            Self::Engine(err) => err.severity(),
            _ => Severity::Error,
        }
    }

    /// Advice for the user, when there is any
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::Engine(err) => err.remediation(),
            Self::CheckoutIncomplete { .. } => {
                Some("See the messages above for the files that need attention.".to_string())
            }
            _ => None,
        }
    }
}
