//! Presentation layer for tribunal
//!
//! This crate contains the CLI definition, the console formatter for
//! decisions and chat results, and the live event renderer.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::renderer::EventRenderer;
