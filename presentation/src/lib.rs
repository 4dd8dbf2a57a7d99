//! Presentation layer for prudence-ensemble
//!
//! This crate contains CLI definitions, output formatters
//! and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormatArg, TemperatureArg};
pub use output::console::ConsoleFormatter;
pub use output::formatter::TurnFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
