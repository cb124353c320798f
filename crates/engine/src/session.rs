//! Server session
//!
//! One identity query per logical operation. The response either parses
//! into a [`ServerSession`] or is classified into a [`SessionError`].

use crate::command::P4Command;
use crate::parser::{
    self, CLIENT_UNKNOWN, NOT_RECOGNIZED, PERMISSION_DENIED, SESSION_EXPIRED,
};
use crate::runner::CommandRunner;
use crate::{Result, SessionError};
use p4gate_core::{Diagnostics, Severity};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const USER_NAME: &str = "User name";
const CLIENT_NAME: &str = "Client name";
const CLIENT_ROOT: &str = "Client root";
const CLIENT_HOST: &str = "Client host";
const SERVER_ADDRESS: &str = "Server address";
const SERVER_UPTIME: &str = "Server uptime";
const SERVER_VERSION: &str = "Server version";

/// Identity of the current user and workspace on the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSession {
    user: String,
    client_name: String,
    client_root: PathBuf,
    client_host: Option<String>,
    server_address: Option<String>,
    server_uptime: Option<String>,
    server_version: Option<String>,
    reachable: bool,
    #[serde(skip)]
    failure: Option<Failure>,
}

/// Why the identity query failed, reported once by [`ServerSession::is_reachable`]
#[derive(Debug, Clone, PartialEq, Eq)]
struct Failure {
    message: String,
    remediation: Option<String>,
}

impl ServerSession {
    /// Session for a server that could not be reached
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Run the identity query
    pub fn query(runner: &CommandRunner<'_>) -> std::result::Result<Self, SessionError> {
        let lines = runner.run(P4Command::Info, &[])?;
        Self::from_info_output(&lines, &runner.binary())
    }

    /// Query the server, downgrading recoverable failures to an unreachable
    /// session that remembers the cause
    ///
    /// Critical failures are returned.
    pub fn connect(runner: &CommandRunner<'_>) -> Result<Self> {
        match Self::query(runner) {
            Ok(session) => {
                debug!(
                    "Connected as {} on workspace {}",
                    session.user, session.client_name
                );
                Ok(session)
            }
            Err(err) if err.severity() == Severity::Critical => Err(err.into()),
            Err(err) => {
                debug!("Identity query failed: {}", err);
                Ok(Self {
                    failure: Some(Failure {
                        message: err.to_string(),
                        remediation: err.remediation(),
                    }),
                    ..Self::unreachable()
                })
            }
        }
    }

    /// Parse an identity response
    pub fn from_info_output<S: AsRef<str>>(
        lines: &[S],
        binary: &Path,
    ) -> std::result::Result<Self, SessionError> {
        if let Some(err) = classify_failure(lines, binary) {
            return Err(err);
        }

        let first = lines
            .iter()
            .map(AsRef::as_ref)
            .find(|line| !line.trim().is_empty());
        match first {
            Some(line) if parser::parse_info_line(line).is_some() => {}
            other => {
                return Err(SessionError::ToolNotInstalled {
                    output: other.unwrap_or_default().trim().to_string(),
                });
            }
        }

        let mut info = parser::parse_info_response(lines);
        let mut require = |key: &'static str| {
            info.shift_remove(key)
                .ok_or(SessionError::MissingField { key })
        };

        let user = require(USER_NAME)?;
        let client_name = require(CLIENT_NAME)?;
        let client_root = PathBuf::from(require(CLIENT_ROOT)?);

        Ok(Self {
            user,
            client_name,
            client_root,
            client_host: info.shift_remove(CLIENT_HOST),
            server_address: info.shift_remove(SERVER_ADDRESS),
            server_uptime: info.shift_remove(SERVER_UPTIME),
            server_version: info.shift_remove(SERVER_VERSION),
            reachable: true,
            failure: None,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Local directory every workspace file lives under
    pub fn client_root(&self) -> &Path {
        &self.client_root
    }

    pub fn client_host(&self) -> Option<&str> {
        self.client_host.as_deref()
    }

    pub fn server_address(&self) -> Option<&str> {
        self.server_address.as_deref()
    }

    pub fn server_uptime(&self) -> Option<&str> {
        self.server_uptime.as_deref()
    }

    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Whether the identity query succeeded, reporting an error when not
    pub fn is_reachable(&self, diagnostics: &Diagnostics, silent: bool) -> bool {
        if self.reachable {
            return true;
        }
        match &self.failure {
            Some(failure) => {
                diagnostics.error(failure.message.clone(), failure.remediation.as_deref(), silent)
            }
            None => diagnostics.error(
                "Perforce server is not reachable",
                Some("Check the connection settings and that you are logged in, then try again."),
                silent,
            ),
        }
    }
}

/// Recognise failure sentinels anywhere in a response
pub fn classify_failure<S: AsRef<str>>(lines: &[S], binary: &Path) -> Option<SessionError> {
    let text = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");

    if text.contains(CLIENT_UNKNOWN) {
        Some(SessionError::ClientUnknown)
    } else if text.contains(PERMISSION_DENIED) {
        Some(SessionError::PermissionDenied {
            binary: binary.to_path_buf(),
        })
    } else if text.contains(SESSION_EXPIRED) {
        Some(SessionError::SessionExpired)
    } else if text.contains(NOT_RECOGNIZED) {
        Some(SessionError::ToolNotInstalled {
            output: text.trim().to_string(),
        })
    } else {
        None
    }
}
