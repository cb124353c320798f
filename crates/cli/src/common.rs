//! Common utilities and types shared across CLI commands

use crate::error::{CommandError, Result};
use crate::reporter::ConsoleReporter;
use p4gate_config::ConnectionConfig;
use p4gate_engine::{CommandRunner, Diagnostics, DuctExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runtime context for CLI commands
///
/// Built once per invocation. Commands borrow a [`CommandRunner`] from it
/// instead of reaching for global connection settings.
#[derive(Clone)]
pub struct RuntimeContext {
    /// Connection settings after CLI overrides
    pub config: Arc<ConnectionConfig>,
    /// Diagnostics sink shared by every component
    pub diagnostics: Diagnostics,
    /// Config file the settings came from, if any
    pub config_file: Option<PathBuf>,
    executor: DuctExecutor,
}

impl RuntimeContext {
    /// Create a context that reports to the terminal
    pub fn new(config: ConnectionConfig, config_file: Option<PathBuf>) -> Self {
        Self::with_diagnostics(
            config,
            config_file,
            Diagnostics::new(Arc::new(ConsoleReporter::new())),
        )
    }

    pub fn with_diagnostics(
        config: ConnectionConfig,
        config_file: Option<PathBuf>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            config: Arc::new(config),
            diagnostics,
            config_file,
            executor: DuctExecutor,
        }
    }

    /// Runner borrowing this context's settings and executor
    pub fn runner(&self) -> CommandRunner<'_> {
        CommandRunner::new(&self.config, &self.executor)
    }
}

/// Turn a user-supplied path into the absolute form the client reports
///
/// Expands a leading `~`. The file does not have to exist yet.
pub fn resolve_local_path(path: &str) -> Result<String> {
    let expanded = expand_tilde(Path::new(path));
    let absolute = std::path::absolute(&expanded).map_err(|source| CommandError::InvalidPath {
        path: expanded.clone(),
        source,
    })?;
    Ok(absolute.to_string_lossy().into_owned())
}

/// Expand tilde (~) in a path to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if !path.as_os_str().as_encoded_bytes().starts_with(b"~") {
        return path.to_path_buf();
    }

    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    match path.to_str() {
        Some("~") => home,
        Some(s) if s.starts_with("~/") => home.join(&s[2..]),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let path = std::env::temp_dir().join("ws").join("a.fbx");
        let resolved = resolve_local_path(&path.to_string_lossy()).unwrap();
        assert_eq!(PathBuf::from(resolved), path);
    }

    #[test]
    fn test_relative_path_made_absolute() {
        let resolved = resolve_local_path("art/hero.fbx").unwrap();
        assert!(Path::new(&resolved).is_absolute());
        assert!(resolved.ends_with("hero.fbx"));
    }

    #[test]
    fn test_tilde_expanded() {
        if let Some(home) = dirs::home_dir() {
            let resolved = resolve_local_path("~/ws/a.fbx").unwrap();
            assert_eq!(PathBuf::from(resolved), home.join("ws/a.fbx"));
        }
    }

    #[test]
    fn test_runner_uses_context_config() {
        let config = ConnectionConfig {
            timeout_secs: 42,
            ..ConnectionConfig::default()
        };
        let context = RuntimeContext::new(config, None);
        assert_eq!(context.runner().config().timeout_secs, 42);
    }
}
