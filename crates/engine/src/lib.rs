//! # p4gate engine
//!
//! Wraps the Perforce command-line client to answer "what is the state of
//! these files?" and to drive the add → sync → edit checkout workflow that
//! must succeed before an asset may be overwritten.
//!
//! - **Command registry**: typed client commands and their argument templates
//! - **Runner**: binary resolution, process execution with a timeout
//! - **Session**: identity/reachability query
//! - **Records**: per-file raw status fields and the derived lifecycle status
//! - **Groups**: batched status queries and batched mutating commands
//! - **Workflow**: the confirmation-gated checkout sequence

pub mod batch;
pub mod command;
pub mod error;
pub mod group;
pub mod parser;
pub mod record;
pub mod runner;
pub mod session;
pub mod status;
pub mod workflow;

pub use p4gate_core::{Diagnostic, Diagnostics, Severity};

pub use batch::{Batch, batch_paths};
pub use command::P4Command;
pub use error::{Error, Result, SessionError};
pub use group::FileRecordGroup;
pub use record::FileRecord;
pub use runner::{CommandRunner, DuctExecutor, ExecOutcome, ProcessExecutor, ProcessOutput};
pub use session::ServerSession;
pub use status::{FileStatus, OtherCheckout, RawFields};
pub use workflow::{
    AlwaysConfirm, CheckoutStep, CheckoutWorkflow, Confirm, InteractionMode,
    WorkingCopyReloader,
};
