//! Output formatting utilities
//!
//! Status messages go to stderr; stdout carries only command results.

mod github;

pub use github::{github_output_path, write_github_outputs};

use console::{style, Style};

/// Print a success message
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    eprintln!("{} {}", style("→").blue(), message);
}

/// Print a follow-up suggestion
pub fn hint(message: &str) {
    eprintln!("  {} {}", style("hint:").cyan(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for project names
pub fn project_style() -> Style {
    Style::new().green().bold()
}

/// Style for commands
pub fn command_style() -> Style {
    Style::new().cyan()
}
