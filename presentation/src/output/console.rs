//! Console output formatter for ensemble turns

use crate::output::formatter::TurnFormatter;
use colored::Colorize;
use ensemble_domain::{Branch, FusionStatus, ModelFamily, ModelRegistry, Turn};

/// Formats turns, transcripts and the model list for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete turn: every branch, then the fused answer
    pub fn format(turn: &Turn) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Ensemble Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n\n",
            "Message:".cyan().bold(),
            turn.user_message
        ));

        let models: Vec<&str> = turn.backend_ids().iter().map(|id| id.as_str()).collect();
        output.push_str(&format!(
            "{} {}\n\n",
            "Models:".cyan().bold(),
            models.join(", ")
        ));

        output.push_str(&Self::section_header("Branch Answers"));
        for branch in &turn.branches {
            output.push_str(&Self::branch(branch));
        }

        output.push_str(&Self::section_header("Fused Answer"));
        output.push_str(&format!(
            "\n{}\n\n",
            format!("Status: {}", turn.fusion_status).yellow().bold()
        ));
        output.push_str(&Self::fused_body(turn));

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON, in the same shape the transcript persists
    pub fn format_json(turn: &Turn) -> String {
        serde_json::to_string_pretty(turn).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the fused answer only (concise output)
    pub fn format_fused_only(turn: &Turn) -> String {
        let mut output = Self::fused_body(turn);

        if let FusionStatus::FallbackConcatenated = turn.fusion_status {
            let reason = turn
                .fusion_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            output.push_str(&format!(
                "\n{}\n",
                format!("(synthesis failed, showing individual answers: {})", reason).dimmed()
            ));
        }

        output
    }

    /// Format a transcript listing, most recent first
    pub fn format_history(turns: &[Turn]) -> String {
        if turns.is_empty() {
            return format!("{}\n", "No turns yet.".dimmed());
        }

        let mut output = Self::section_header("Transcript");
        for (i, turn) in turns.iter().enumerate() {
            let status = match turn.fusion_status {
                FusionStatus::Synthesized => turn.fusion_status.as_str().green(),
                FusionStatus::FallbackConcatenated => turn.fusion_status.as_str().yellow(),
                _ => turn.fusion_status.as_str().red(),
            };
            output.push_str(&format!(
                "{:>3}. {} {} [{}]\n     {}\n",
                i + 1,
                turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                turn.title().bold(),
                status,
                turn.turn_id.to_string().dimmed()
            ));
        }
        output
    }

    /// Format the model registry grouped by family
    pub fn format_models(registry: &ModelRegistry) -> String {
        let mut output = String::new();

        for (family, title) in [
            (ModelFamily::Primary, "Primary models"),
            (ModelFamily::Synthesis, "Synthesis models"),
        ] {
            output.push_str(&Self::section_header(title));
            for descriptor in registry.list(family) {
                output.push_str(&format!(
                    "  {} {:<36} {} ({})\n      {}\n",
                    descriptor.icon,
                    descriptor.id.as_str().bold(),
                    descriptor.display_name,
                    descriptor.provider,
                    descriptor.description.dimmed()
                ));
            }
        }

        output
    }

    fn branch(branch: &Branch) -> String {
        let elapsed = branch
            .elapsed_ms()
            .map(|ms| format!(" ({} ms)", ms))
            .unwrap_or_default();

        match (&branch.text, &branch.error) {
            (Some(text), _) => format!(
                "\n{}\n{}\n",
                format!("── {}{} ──", branch.backend_id, elapsed).yellow().bold(),
                text
            ),
            (None, Some(error)) => format!(
                "\n{}\nError: {}\n",
                format!("── {}{} ──", branch.backend_id, elapsed).red().bold(),
                error
            ),
            (None, None) => format!(
                "\n{}\n",
                format!("── {} (pending) ──", branch.backend_id).dimmed()
            ),
        }
    }

    fn fused_body(turn: &Turn) -> String {
        match &turn.fused_answer {
            Some(answer) => format!("{}\n", answer),
            None => {
                let mut output = format!("{}\n", "No backend produced an answer.".red().bold());
                for branch in turn.failed_branches() {
                    if let Some(error) = &branch.error {
                        output.push_str(&format!("  {} {}: {}\n", "x".red(), branch.backend_id, error));
                    }
                }
                output
            }
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl TurnFormatter for ConsoleFormatter {
    fn format_full(&self, turn: &Turn) -> String {
        Self::format(turn)
    }

    fn format_fused(&self, turn: &Turn) -> String {
        Self::format_fused_only(turn)
    }

    fn format_json(&self, turn: &Turn) -> String {
        Self::format_json(turn)
    }
}
