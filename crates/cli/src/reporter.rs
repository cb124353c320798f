//! Terminal diagnostics reporter
//!
//! Interruptive diagnostics (non-silent errors and all critical ones) are
//! printed to stderr with their remediation and kept in the debug log.
//! Everything else goes to tracing only.

use owo_colors::OwoColorize;
use p4gate_core::{Diagnostic, Reporter, Severity, TracingReporter};
use std::io::{IsTerminal, Write};

/// Reporter for the interactive command line
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    tracing: TracingReporter,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        if !diagnostic.is_interruptive() {
            self.tracing.report(diagnostic);
            return;
        }

        tracing::debug!(severity = %diagnostic.severity, "{}", diagnostic.full_message());
        let colored = std::io::stderr().is_terminal();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", render(diagnostic, colored));
    }
}

/// Format a diagnostic for the terminal
pub fn render(diagnostic: &Diagnostic, colored: bool) -> String {
    let label = match diagnostic.severity {
        Severity::Log => "note",
        Severity::Error => "error",
        Severity::Critical => "critical",
    };

    let mut out = if colored {
        match diagnostic.severity {
            Severity::Critical => format!("{}: {}", label.red().bold(), diagnostic.message),
            Severity::Error => format!("{}: {}", label.red(), diagnostic.message),
            Severity::Log => format!("{}: {}", label.dimmed(), diagnostic.message),
        }
    } else {
        format!("{label}: {}", diagnostic.message)
    };

    if let Some(remediation) = &diagnostic.remediation {
        out.push('\n');
        if colored {
            out.push_str(&format!("  {} {remediation}", "help:".cyan()));
        } else {
            out.push_str(&format!("  help: {remediation}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_with_remediation() {
        let diagnostic = Diagnostic::error("/ws/a.fbx is checked out by rigger")
            .with_remediation("Ask them to submit or revert the file first.");

        assert_eq!(
            render(&diagnostic, false),
            "error: /ws/a.fbx is checked out by rigger\n  help: Ask them to submit or revert the file first."
        );
    }

    #[test]
    fn test_render_critical_label() {
        let diagnostic = Diagnostic::critical("Identity response is missing the 'Client name' field");
        assert!(render(&diagnostic, false).starts_with("critical: "));
    }

    #[test]
    fn test_silent_error_not_interruptive() {
        let diagnostic = Diagnostic::error("No status returned").silent(true);
        assert!(!diagnostic.is_interruptive());
    }
}
