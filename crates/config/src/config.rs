//! Connection configuration
//!
//! Settings for reaching the version-control server through its command-line
//! client. A single [`ConnectionConfig`] is built at startup and handed by
//! reference to everything that runs the client.
//!
//! ```toml
//! [connection]
//! port = "ssl:perforce.example.com:1666"
//! user = "artist"
//! client = "artist-workstation"
//! overrideConnection = true
//! timeoutSecs = 15
//! ```

use crate::Result;
use p4gate_core::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for a single client invocation
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default maximum length of the joined, quoted path list in one invocation
pub const DEFAULT_MAX_BATCH_LENGTH: usize = 1000;

/// Shortest possible quoted path (`"x"`)
const MIN_BATCH_LENGTH: usize = 3;

/// Connection settings for the version-control client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Server address (`P4PORT`)
    #[serde(default)]
    pub port: Option<String>,

    /// User name (`P4USER`)
    #[serde(default)]
    pub user: Option<String>,

    /// Workspace name (`P4CLIENT`)
    #[serde(default)]
    pub client: Option<String>,

    /// Explicit path to the client binary; platform default when unset
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Pass port/user/client explicitly instead of relying on the client's
    /// own environment and config files
    #[serde(default)]
    pub override_connection: bool,

    /// Seconds before an invocation is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum joined path length per invocation
    #[serde(default = "default_max_batch_length")]
    pub max_batch_length: usize,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_batch_length() -> usize {
    DEFAULT_MAX_BATCH_LENGTH
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: None,
            user: None,
            client: None,
            binary: None,
            override_connection: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_batch_length: DEFAULT_MAX_BATCH_LENGTH,
        }
    }
}

/// On-disk layout of the config file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    connection: ConnectionConfig,
}

impl ConnectionConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Self::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {e}", path.display()))
        })
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config TOML: {e}")))?;
        file.connection.validate()?;
        Ok(file.connection)
    }

    /// Load from `path` if given, else from the default location
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match crate::dirs::default_config_file() {
            Some(default_path) if default_path.exists() => {
                tracing::debug!("Loading config from {}", default_path.display());
                Self::load(default_path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeoutSecs must be greater than zero".into()));
        }
        if self.max_batch_length < MIN_BATCH_LENGTH {
            return Err(Error::Config(format!(
                "maxBatchLength must be at least {MIN_BATCH_LENGTH}, got {}",
                self.max_batch_length
            )));
        }
        Ok(())
    }

    /// Invocation timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Global arguments placed before every client command
    pub fn connection_args(&self) -> Vec<String> {
        if !self.override_connection {
            return Vec::new();
        }

        let mut args = Vec::with_capacity(6);
        for (flag, value) in [("-p", &self.port), ("-u", &self.user), ("-c", &self.client)] {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        args
    }
}
