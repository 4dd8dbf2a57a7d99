//! Model descriptors for the backends an ensemble can consult

use serde::{Deserialize, Serialize};

/// Identifier of a backend model (Value Object)
///
/// The registry key for a [`ModelDescriptor`], e.g. `"qwen-3-32b"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which execution family a backend serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Answers the user message directly as one branch of a turn
    Primary,
    /// Merges primary answers into the fused answer
    Synthesis,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Primary => "primary",
            ModelFamily::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Network API a backend is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Cerebras,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Cerebras => "cerebras",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cerebras" => Ok(ProviderKind::Cerebras),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// A known backend (Value Object)
///
/// Loaded once at process start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: ModelId,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub max_tokens: u32,
    pub family: ModelFamily,
    pub provider: ProviderKind,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<ModelId>,
        display_name: impl Into<String>,
        family: ModelFamily,
        provider: ProviderKind,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            icon: String::new(),
            max_tokens: 8192,
            family,
            provider,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn is_primary(&self) -> bool {
        self.family == ModelFamily::Primary
    }

    pub fn is_synthesis(&self) -> bool {
        self.family == ModelFamily::Synthesis
    }
}
