//! Progress spinner
//!
//! indicatif hides the spinner by itself when stderr is not a terminal.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for a blocking server call
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("spinner template is valid"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
