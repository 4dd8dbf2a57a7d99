//! Prompt templates for the fusion step

/// Separator placed between branch texts when fusion falls back to
/// concatenation.
pub const FALLBACK_SEPARATOR: &str = "\n\n---\n\n";

/// Templates for building the synthesis prompt
pub struct PromptTemplate;

impl PromptTemplate {
    /// Instruction appended after the contributor answers
    pub fn synthesis_instruction() -> &'static str {
        r#"Please synthesize these responses into one comprehensive, coherent answer. Combine the best insights from each, resolve any contradictions, and create a unified response that captures the full scope of the topic. Make it natural and well-structured."#
    }

    /// Prompt asking the synthesis backend to merge the given answers.
    ///
    /// `contributions` are `(display name, text)` pairs in selection order.
    /// Each is labelled `Model k (Name)` so the synthesis backend can tell
    /// contributors apart.
    pub fn synthesis_prompt(user_message: &str, contributions: &[(String, String)]) -> String {
        let mut prompt = format!(
            "Here are responses from {} different AI models about: \"{}\"\n",
            contributions.len(),
            user_message
        );

        let body = contributions
            .iter()
            .enumerate()
            .map(|(i, (name, text))| format!("Model {} ({}): {}", i + 1, name, text))
            .collect::<Vec<_>>()
            .join("\n\n");
        prompt.push_str(&body);

        prompt.push_str("\n\n");
        prompt.push_str(Self::synthesis_instruction());
        prompt
    }

    /// Deterministic fused answer used when synthesis fails
    pub fn fallback_concatenation<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
        texts.into_iter().collect::<Vec<_>>().join(FALLBACK_SEPARATOR)
    }
}
