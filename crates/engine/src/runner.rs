//! Command runner
//!
//! Resolves the platform's client binary, makes sure it is executable, runs
//! one command with a bounded timeout and hands back its output as lines.
//! Process spawning sits behind [`ProcessExecutor`] so everything above it
//! can be exercised without a real client.

use crate::command::{P4Command, VCS_PREFIX};
use crate::parser::{self, SESSION_EXPIRED};
use crate::{Error, Result, SessionError};
use p4gate_config::ConnectionConfig;
use p4gate_core::platform::CURRENT_PLATFORM;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Client location inside the P4V application bundle
const MACOS_BINARY: &str = "/Applications/p4v.app/Contents/Resources/p4";

/// Conventional install location on Linux
const LINUX_BINARY: &str = "/usr/local/bin/p4";

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// stdout with stderr merged in
    pub stdout: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// How a process invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Completed(ProcessOutput),
    /// The timeout elapsed; the process has been killed
    TimedOut,
}

/// Process abstraction
pub trait ProcessExecutor {
    /// Run `program` with `args`, waiting at most `timeout`
    fn execute(&self, program: &Path, args: &[String], timeout: Duration)
    -> io::Result<ExecOutcome>;
}

/// Executor that spawns real processes through duct
#[derive(Debug, Clone, Copy, Default)]
pub struct DuctExecutor;

impl ProcessExecutor for DuctExecutor {
    fn execute(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> io::Result<ExecOutcome> {
        // The client reports sentinels such as "no such file(s)" on stderr
        let handle = duct::cmd(program, args)
            .stdin_null()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .start()?;

        match handle.wait_timeout(timeout)? {
            Some(output) => Ok(ExecOutcome::Completed(ProcessOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                exit_code: output.status.code(),
            })),
            None => {
                handle.kill()?;
                Ok(ExecOutcome::TimedOut)
            }
        }
    }
}

/// Runs client commands using one connection configuration
pub struct CommandRunner<'a> {
    config: &'a ConnectionConfig,
    executor: &'a dyn ProcessExecutor,
}

impl<'a> CommandRunner<'a> {
    pub fn new(config: &'a ConnectionConfig, executor: &'a dyn ProcessExecutor) -> Self {
        Self { config, executor }
    }

    /// Connection settings this runner was built with
    pub fn config(&self) -> &ConnectionConfig {
        self.config
    }

    /// Client binary this runner invokes, for use in messages
    pub fn binary(&self) -> PathBuf {
        resolve_binary(self.config).unwrap_or_else(|_| PathBuf::from(VCS_PREFIX))
    }

    /// Run a registered command on `files`
    #[tracing::instrument(skip(self, files), fields(command = %command, files = files.len()))]
    pub fn run(&self, command: P4Command, files: &[String]) -> Result<Vec<String>> {
        let mut args = self.config.connection_args();
        args.extend(command.invocation(files));
        self.execute(&args)
    }

    /// Run a full command line such as `p4 fstat "/ws/a b.fbx"`
    ///
    /// The line must start with the `p4` prefix and name a registered
    /// command; anything else is a programming error.
    pub fn run_line(&self, line: &str) -> Result<Vec<String>> {
        let words = shell_words::split(line)
            .map_err(|e| Error::InvalidCommand(format!("cannot parse '{line}': {e}")))?;

        let Some((prefix, rest)) = words.split_first() else {
            return Err(Error::InvalidCommand("empty command line".to_string()));
        };
        if prefix != VCS_PREFIX {
            return Err(Error::InvalidCommand(format!(
                "command must start with '{VCS_PREFIX}': {line}"
            )));
        }

        let name = rest
            .iter()
            .find(|word| !word.starts_with('-'))
            .ok_or_else(|| Error::InvalidCommand(format!("no sub-command in '{line}'")))?;
        P4Command::parse(name)?;

        let mut args = self.config.connection_args();
        args.extend(rest.iter().cloned());
        self.execute(&args)
    }

    fn execute(&self, args: &[String]) -> Result<Vec<String>> {
        let binary = resolve_binary(self.config)?;
        if !binary.exists() {
            return Err(Error::ToolMissing { path: binary });
        }
        ensure_executable(&binary);

        let command_line = format!("{VCS_PREFIX} {}", shell_words::join(args));
        let timeout = self.config.timeout();
        debug!("Running: {}", command_line);

        let outcome = self
            .executor
            .execute(&binary, args, timeout)
            .map_err(|e| match e.kind() {
                io::ErrorKind::PermissionDenied => Error::Session(SessionError::PermissionDenied {
                    binary: binary.clone(),
                }),
                io::ErrorKind::NotFound => Error::ToolMissing {
                    path: binary.clone(),
                },
                _ => Error::ToolError {
                    command: command_line.clone(),
                    message: e.to_string(),
                },
            })?;

        let output = match outcome {
            ExecOutcome::Completed(output) => output,
            ExecOutcome::TimedOut => {
                return Err(Error::Timeout {
                    command: command_line,
                    seconds: timeout.as_secs(),
                });
            }
        };

        if output.stdout.contains(SESSION_EXPIRED) {
            return Err(SessionError::SessionExpired.into());
        }

        if !output.success() && !parser::contains_sentinel(&output.stdout) {
            let message = output
                .stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map_or_else(
                    || format!("exit status {:?}", output.exit_code),
                    ToString::to_string,
                );
            return Err(Error::ToolError {
                command: command_line,
                message,
            });
        }

        Ok(split_lines(&output.stdout))
    }
}

/// Split output into lines, dropping carriage returns
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Path of the client binary for the current platform
///
/// An explicit `binary` in the configuration always wins.
pub fn resolve_binary(config: &ConnectionConfig) -> Result<PathBuf> {
    if let Some(binary) = &config.binary {
        return Ok(binary.clone());
    }

    match CURRENT_PLATFORM.os {
        "windows" => which::which(VCS_PREFIX).map_err(|_| Error::ToolMissing {
            path: PathBuf::from(VCS_PREFIX),
        }),
        "darwin" => Ok(PathBuf::from(MACOS_BINARY)),
        _ => Ok(which::which(VCS_PREFIX).unwrap_or_else(|_| PathBuf::from(LINUX_BINARY))),
    }
}

/// Add execute permission to an installed binary that lacks it
#[cfg(unix)]
pub fn ensure_executable(binary: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(binary) else {
        return;
    };
    let mode = metadata.permissions().mode();
    if mode & 0o111 == 0o111 {
        return;
    }

    debug!("Adding execute permission to {}", binary.display());
    if let Err(e) = std::fs::set_permissions(binary, std::fs::Permissions::from_mode(mode | 0o111))
    {
        warn!("Could not make {} executable: {}", binary.display(), e);
    }
}

/// Windows decides executability by extension
#[cfg(not(unix))]
pub fn ensure_executable(_binary: &Path) {}
