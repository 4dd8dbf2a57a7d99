//! Fusion configuration from TOML (`[fusion]` section)

use ensemble_application::FusionParams;
use ensemble_domain::{ModelId, clamp_temperature};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFusionConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Synthesis deadline in seconds
    pub timeout_seconds: u64,
}

impl Default for FileFusionConfig {
    fn default() -> Self {
        let params = FusionParams::default();
        Self {
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            timeout_seconds: params.timeout.as_secs(),
        }
    }
}

impl FileFusionConfig {
    /// Build fusion params; `synthesis_model` comes from `[ensemble]`
    pub fn to_params(&self, synthesis_model: Option<&str>) -> FusionParams {
        let mut params = FusionParams::default()
            .with_max_tokens(self.max_tokens)
            .with_timeout(Duration::from_secs(self.timeout_seconds));
        params.temperature = clamp_temperature(self.temperature);
        if let Some(model) = synthesis_model {
            params = params.with_synthesis_model(ModelId::from(model));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_params() {
        let config = FileFusionConfig {
            temperature: 0.4,
            max_tokens: 2000,
            timeout_seconds: 10,
        };
        let params = config.to_params(Some("gemini-2.0-flash"));
        assert_eq!(params.synthesis_model.as_str(), "gemini-2.0-flash");
        assert_eq!(params.max_tokens, 2000);
        assert_eq!(params.timeout, Duration::from_secs(10));
        assert_eq!(params.temperature, 0.4);
    }

    #[test]
    fn test_default_synthesis_model() {
        let params = FileFusionConfig::default().to_params(None);
        assert_eq!(params.synthesis_model.as_str(), "gemini-2.5-flash");
    }
}
