//! Terminal output and interaction.
//!
//! Warnings and errors carry distinct prefixes on purpose: automated log
//! scraping must be able to tell a non-fatal warning from a terminal error.

use console::style;
use std::io::{self, Write};

use crate::error::Result;

/// Print a fatal error message in red to stderr.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a non-fatal warning in yellow to stderr.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("WARNING:").yellow().bold(), message);
}

/// Print a success message with a green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print a progress/status message with a yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print an actionable hint line beneath an error.
pub fn display_hint(message: &str) {
    eprintln!("   {} {}", style("→").cyan(), message);
}

/// Prompt for a yes/no confirmation. Default is "no" on empty input.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Prompt for a free-form answer.
pub fn ask(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
