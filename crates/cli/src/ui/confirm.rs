//! Interactive confirmation of checkout steps

use dialoguer::{Confirm as Prompt, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use p4gate_engine::{CheckoutStep, Confirm};

/// Files listed before the prompt; the rest are summarised
const MAX_LISTED: usize = 10;

/// Asks on the terminal before each mutating step
#[derive(Debug, Default)]
pub struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, step: CheckoutStep, files: &[String]) -> bool {
        println!("{}", step.prompt(files.len()).bold());
        for line in listing(files) {
            println!("  {line}");
        }

        match Prompt::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Proceed with {step}?"))
            .default(true)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Prompt failed, treating as declined: {}", e);
                false
            }
        }
    }
}

fn listing(files: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = files.iter().take(MAX_LISTED).cloned().collect();
    if files.len() > MAX_LISTED {
        lines.push(format!("... and {} more", files.len() - MAX_LISTED));
    }
    lines
}
