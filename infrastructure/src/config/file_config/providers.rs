//! Provider configuration from TOML (`[providers]` section)

use ensemble_domain::{CerebrasProviderConfig, GeminiProviderConfig, ProviderConfig};
use serde::{Deserialize, Serialize};

/// Cerebras API provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCerebrasConfig {
    /// Environment variable name for the API key (default: "CEREBRAS_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the Cerebras API.
    pub base_url: String,
}

impl Default for FileCerebrasConfig {
    fn default() -> Self {
        let defaults = CerebrasProviderConfig::default();
        Self {
            api_key_env: defaults.api_key_env,
            api_key: defaults.api_key,
            base_url: defaults.base_url,
        }
    }
}

/// Gemini API provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeminiConfig {
    /// Environment variable name for the API key (default: "GEMINI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Base URL of the `models` endpoint.
    pub base_url: String,
}

impl Default for FileGeminiConfig {
    fn default() -> Self {
        let defaults = GeminiProviderConfig::default();
        Self {
            api_key_env: defaults.api_key_env,
            api_key: defaults.api_key,
            base_url: defaults.base_url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub cerebras: FileCerebrasConfig,
    pub gemini: FileGeminiConfig,
}

impl FileProvidersConfig {
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            cerebras: CerebrasProviderConfig {
                api_key_env: self.cerebras.api_key_env.clone(),
                api_key: self.cerebras.api_key.clone(),
                base_url: self.cerebras.base_url.clone(),
            },
            gemini: GeminiProviderConfig {
                api_key_env: self.gemini.api_key_env.clone(),
                api_key: self.gemini.api_key.clone(),
                base_url: self.gemini.base_url.clone(),
            },
        }
    }
}
