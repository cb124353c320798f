//! Diagnostics taxonomy
//!
//! Every component reports through a [`Diagnostics`] handle rather than a
//! global logger. Three severities exist:
//!
//! - [`Severity::Log`]: informational, never interrupts the user
//! - [`Severity::Error`]: a recoverable precondition failed; carries a
//!   remediation hint and may be raised silently (logged only) when the
//!   caller runs in a background context
//! - [`Severity::Critical`]: an unrecoverable invariant violation; always
//!   surfaces and terminates the host process
//!
//! Reporters own their own state (the time of the previous diagnostic), so
//! two independent reporters never share a clock.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational confirmation
    Log,
    /// Recoverable precondition failure
    Error,
    /// Unrecoverable; terminates the process
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Error => f.write_str("error"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// A single reported diagnostic
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Human-actionable advice on how to fix the problem
    pub remediation: Option<String>,
    /// Silent diagnostics are logged but never shown interruptively
    pub silent: bool,
    pub timestamp: DateTime<Local>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            remediation: None,
            silent: false,
            timestamp: Local::now(),
        }
    }

    /// Create a log-level diagnostic
    pub fn log(message: impl Into<String>) -> Self {
        Self::new(Severity::Log, message).silent(true)
    }

    /// Create an error-level diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a critical diagnostic
    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, message)
    }

    /// Attach remediation text
    #[must_use]
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Mark the diagnostic silent (critical diagnostics ignore this)
    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Whether this diagnostic should interrupt the user
    pub fn is_interruptive(&self) -> bool {
        match self.severity {
            Severity::Log => false,
            Severity::Error => !self.silent,
            Severity::Critical => true,
        }
    }

    /// Message followed by remediation, if any
    pub fn full_message(&self) -> String {
        match &self.remediation {
            Some(remediation) => format!("{}\n{}", self.message, remediation),
            None => self.message.clone(),
        }
    }
}

/// Sink for diagnostics
pub trait Reporter: Send + Sync {
    /// Handle one diagnostic
    fn report(&self, diagnostic: &Diagnostic);
}

/// Reporter that forwards every diagnostic to `tracing`
///
/// Each record carries the time elapsed since this reporter's previous
/// diagnostic.
#[derive(Debug, Default)]
pub struct TracingReporter {
    last: Mutex<Option<Instant>>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn elapsed_since_last(&self) -> Duration {
        let now = Instant::now();
        let Ok(mut guard) = self.last.lock() else {
            return Duration::ZERO;
        };
        let elapsed = guard.map_or(Duration::ZERO, |previous| now - previous);
        *guard = Some(now);
        elapsed
    }
}

impl Reporter for TracingReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        let elapsed_ms = self.elapsed_since_last().as_millis();
        let message = diagnostic.full_message();
        match diagnostic.severity {
            Severity::Log => tracing::debug!(elapsed_ms, "{message}"),
            Severity::Error => {
                tracing::warn!(elapsed_ms, silent = diagnostic.silent, "{message}");
            }
            Severity::Critical => tracing::error!(elapsed_ms, "{message}"),
        }
    }
}

/// Reporter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of diagnostics with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Messages of every diagnostic with the given severity
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic.clone());
        }
    }
}

/// Cloneable handle passed explicitly to every component
#[derive(Clone)]
pub struct Diagnostics {
    reporter: Arc<dyn Reporter>,
}

impl Diagnostics {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Handle backed by a fresh [`TracingReporter`]
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingReporter::new()))
    }

    /// Report a prepared diagnostic
    pub fn report(&self, diagnostic: &Diagnostic) {
        self.reporter.report(diagnostic);
    }

    /// Report an informational message
    pub fn log(&self, message: impl Into<String>) {
        self.report(&Diagnostic::log(message));
    }

    /// Report a recoverable failure
    ///
    /// Always returns `false` so precondition checks can end with
    /// `return diagnostics.error(..)`.
    pub fn error(
        &self,
        message: impl Into<String>,
        remediation: Option<&str>,
        silent: bool,
    ) -> bool {
        let mut diagnostic = Diagnostic::error(message).silent(silent);
        if let Some(remediation) = remediation {
            diagnostic = diagnostic.with_remediation(remediation);
        }
        self.report(&diagnostic);
        false
    }

    /// Report an unrecoverable failure
    ///
    /// Reporting does not terminate anything by itself; the process entry
    /// point owns termination once the matching error reaches it.
    pub fn critical(&self, message: impl Into<String>, remediation: Option<&str>) {
        let mut diagnostic = Diagnostic::critical(message);
        if let Some(remediation) = remediation {
            diagnostic = diagnostic.with_remediation(remediation);
        }
        self.report(&diagnostic);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn memory() -> (Arc<MemoryReporter>, Diagnostics) {
        let reporter = Arc::new(MemoryReporter::new());
        let diagnostics = Diagnostics::new(reporter.clone());
        (reporter, diagnostics)
    }

    #[test]
    fn test_error_returns_false_and_records_remediation() {
        let (reporter, diagnostics) = memory();

        let ok = diagnostics.error("not reachable", Some("check the server"), false);

        assert!(!ok);
        let entries = reporter.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(entries[0].remediation.as_deref(), Some("check the server"));
        assert!(entries[0].is_interruptive());
    }

    #[test]
    fn test_silent_error_is_not_interruptive() {
        let (reporter, diagnostics) = memory();
        diagnostics.error("checked out by someone else", None, true);
        assert!(!reporter.entries()[0].is_interruptive());
    }

    #[test]
    fn test_log_never_interrupts() {
        let diagnostic = Diagnostic::log("under workspace root").silent(false);
        assert!(!diagnostic.is_interruptive());
    }

    #[test]
    fn test_critical_ignores_silent_flag() {
        let diagnostic = Diagnostic::critical("malformed response").silent(true);
        assert!(diagnostic.is_interruptive());
    }

    #[test]
    fn test_counts_by_severity() {
        let (reporter, diagnostics) = memory();
        diagnostics.log("a");
        diagnostics.log("b");
        diagnostics.error("c", None, false);
        diagnostics.critical("d", Some("restart"));

        assert_eq!(reporter.count(Severity::Log), 2);
        assert_eq!(reporter.count(Severity::Error), 1);
        assert_eq!(reporter.messages(Severity::Critical), vec!["d".to_string()]);
        assert_eq!(reporter.entries()[3].remediation.as_deref(), Some("restart"));
    }

    #[test]
    fn test_full_message_appends_remediation() {
        let diagnostic = Diagnostic::error("denied").with_remediation("chmod +x p4");
        assert_eq!(diagnostic.full_message(), "denied\nchmod +x p4");
    }

    #[test]
    fn test_tracing_reporter_tracks_own_clock() {
        let first = TracingReporter::new();
        let second = TracingReporter::new();
        first.report(&Diagnostic::log("x"));
        assert!(first.last.lock().unwrap().is_some());
        assert!(second.last.lock().unwrap().is_none());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Log < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
        assert_eq!(Severity::Critical.to_string(), "critical");
    }
}
