//! Configuration management for p4gate
//!
//! This crate handles:
//! - Connection settings for the version-control client
//! - XDG directory management
//! - Logging initialization

pub mod config;
pub mod dirs;
pub mod logging;

// Re-export error types from core
pub use p4gate_core::{Error, Result};

// Re-export main types
pub use config::{ConnectionConfig, DEFAULT_MAX_BATCH_LENGTH, DEFAULT_TIMEOUT_SECS};
pub use dirs::{config_dir, default_config_file};
