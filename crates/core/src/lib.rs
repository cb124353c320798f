//! Core types and utilities for p4gate
//!
//! This is the foundation crate (Layer 0) that all other p4gate crates depend on.
//! It provides:
//! - The three-tier diagnostics taxonomy (Log, Error, Critical) and reporters
//! - Base error types
//! - Platform detection (path case sensitivity)
//! - Workspace path helpers
//!
//! This crate has no dependencies on other p4gate crates.

pub mod diagnostics;
pub mod error;
pub mod path;
pub mod platform;

pub use diagnostics::{Diagnostic, Diagnostics, MemoryReporter, Reporter, Severity, TracingReporter};
pub use error::{Error, Result};
