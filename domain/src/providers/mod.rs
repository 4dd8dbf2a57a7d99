//! Provider configuration types (provider-neutral, serde-free).
//!
//! These types define the shape of provider settings without depending
//! on any serialization format (TOML, JSON, etc.).

/// Top-level provider configuration.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Cerebras inference API settings.
    pub cerebras: CerebrasProviderConfig,
    /// Google Gemini API settings.
    pub gemini: GeminiProviderConfig,
}

/// Cerebras (OpenAI-compatible chat completions) provider configuration.
#[derive(Debug, Clone)]
pub struct CerebrasProviderConfig {
    /// Environment variable name for the API key (default: "CEREBRAS_API_KEY").
    pub api_key_env: String,
    /// Direct API key (prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the Cerebras API.
    pub base_url: String,
}

impl Default for CerebrasProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "CEREBRAS_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.cerebras.ai".to_string(),
        }
    }
}

/// Google Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    /// Environment variable name for the API key (default: "GEMINI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the models endpoint.
    pub base_url: String,
}

impl Default for GeminiProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }
}

/// Resolve an API key: explicit value first, then the named env var.
pub fn resolve_api_key(explicit: Option<&str>, env_var: &str) -> Option<String> {
    explicit
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.is_empty()))
}
