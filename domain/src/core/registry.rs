//! Model registry: the read-only table of known backends

use crate::core::model::{ModelDescriptor, ModelFamily, ModelId, ProviderKind};

/// Id of the backend used for fusion when nothing else is configured.
pub const DEFAULT_SYNTHESIS_MODEL: &str = "gemini-2.5-flash";

/// Static table of known backends
///
/// Lookup only: selection validation (size, family, duplicates) is the
/// caller's job. Iteration order is registration order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry from descriptors. A later descriptor with an id that
    /// is already registered is ignored.
    pub fn new(descriptors: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut models: Vec<ModelDescriptor> = Vec::new();
        for descriptor in descriptors {
            if !models.iter().any(|m| m.id == descriptor.id) {
                models.push(descriptor);
            }
        }
        Self { models }
    }

    /// The backends shipped with the application.
    pub fn builtin() -> Self {
        use ModelFamily::{Primary, Synthesis};
        use ProviderKind::{Cerebras, Gemini};

        Self::new([
            ModelDescriptor::new("llama3-8b", "Llama 3 8B", Primary, Cerebras)
                .with_description("Compact Llama 3 model for quick answers")
                .with_icon("🦙")
                .with_max_tokens(8192),
            ModelDescriptor::new("llama3-70b", "Llama 3 70B", Primary, Cerebras)
                .with_description("Large Llama 3 model for detailed reasoning")
                .with_icon("🦙")
                .with_max_tokens(8192),
            ModelDescriptor::new(
                "llama4-scout-17b-16e-instruct",
                "Llama 4 Scout",
                Primary,
                Cerebras,
            )
            .with_description("Llama 4 mixture-of-experts model tuned for instructions")
            .with_icon("🔭")
            .with_max_tokens(8192),
            ModelDescriptor::new(
                "llama4-maverick-17b-128e-instruct",
                "Llama 4 Maverick",
                Primary,
                Cerebras,
            )
            .with_description("Llama 4 with 128 experts for broad general knowledge")
            .with_icon("🐎")
            .with_max_tokens(8192),
            ModelDescriptor::new("qwen-3-32b", "Qwen 3 32B", Primary, Cerebras)
                .with_description("Qwen 3 dense model with strong multilingual ability")
                .with_icon("🐉")
                .with_max_tokens(8192),
            ModelDescriptor::new("qwen-3-235b-a22b", "Qwen 3 235B", Primary, Cerebras)
                .with_description("Largest Qwen 3 mixture-of-experts model")
                .with_icon("🐉")
                .with_max_tokens(8192),
            ModelDescriptor::new("gemini-2.0-flash", "Gemini 2.0 Flash", Primary, Gemini)
                .with_description("Fast and reliable model for everyday tasks")
                .with_icon("✨")
                .with_max_tokens(8192),
            ModelDescriptor::new(DEFAULT_SYNTHESIS_MODEL, "Gemini 2.5 Flash", Synthesis, Gemini)
                .with_description("Latest fast and efficient model, used to fuse answers")
                .with_icon("✨")
                .with_max_tokens(8192),
        ])
    }

    /// Default backend selection for a new session
    pub fn default_selection() -> Vec<ModelId> {
        vec![
            ModelId::from("llama4-maverick-17b-128e-instruct"),
            ModelId::from("gemini-2.0-flash"),
            ModelId::from("qwen-3-32b"),
        ]
    }

    /// Look up a backend by id
    pub fn describe(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id.as_str() == id)
    }

    /// All backends of one family, in registration order
    pub fn list(&self, family: ModelFamily) -> Vec<&ModelDescriptor> {
        self.models.iter().filter(|m| m.family == family).collect()
    }

    /// All backends, in registration order
    pub fn all(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Display name for an id, falling back to the id itself
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.describe(id)
            .map(|m| m.display_name.as_str())
            .unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
