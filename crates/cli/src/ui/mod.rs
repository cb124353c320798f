//! Terminal UI components for p4gate
//!
//! - Confirmation prompts for checkout steps
//! - Progress spinners for server round-trips

pub mod confirm;
pub mod progress;

pub use confirm::PromptConfirm;
pub use progress::create_spinner;
