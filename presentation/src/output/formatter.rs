//! Output formatter trait

use ensemble_domain::{OutputFormat, Turn};

/// Trait for rendering finished turns
pub trait TurnFormatter {
    /// Every branch answer followed by the fused answer
    fn format_full(&self, turn: &Turn) -> String;

    /// Only the fused answer (concise output)
    fn format_fused(&self, turn: &Turn) -> String;

    /// The persisted turn shape as JSON
    fn format_json(&self, turn: &Turn) -> String;

    /// Render in the requested format
    fn render(&self, turn: &Turn, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format_full(turn),
            OutputFormat::Fused => self.format_fused(turn),
            OutputFormat::Json => self.format_json(turn),
        }
    }
}
