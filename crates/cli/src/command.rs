//! Command trait for the p4gate CLI
//!
//! Every subcommand implements [`Command`] and receives the shared
//! [`RuntimeContext`], which owns the connection settings, the diagnostics
//! handle and the process executor.

use crate::common::RuntimeContext;
use crate::error::Result;

/// Trait for all p4gate commands
///
/// # Example
///
/// ```rust,ignore
/// use crate::command::Command;
/// use crate::common::RuntimeContext;
/// use crate::error::Result;
/// use clap::Args;
///
/// #[derive(Debug, Args)]
/// pub struct MyCommand {
///     #[arg(short, long)]
///     pub some_flag: bool,
/// }
///
/// impl Command for MyCommand {
///     type Output = ();
///
///     fn execute(&self, context: &RuntimeContext) -> Result<()> {
///         let runner = context.runner();
///         Ok(())
///     }
/// }
/// ```
pub trait Command {
    /// The type returned by this command
    type Output;

    /// Execute the command with the given runtime context
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` if the command fails. Engine failures keep
    /// their severity so the entry point can pick the exit code.
    fn execute(&self, context: &RuntimeContext) -> Result<Self::Output>;
}
