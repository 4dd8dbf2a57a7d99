//! Value objects exchanged with backend adapters

use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};

/// Temperature used when a backend has no explicit setting.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Token budget for a primary branch.
pub const DEFAULT_BRANCH_MAX_TOKENS: u32 = 1000;

/// Per-call generation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOptions {
    pub model: ModelId,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl DispatchOptions {
    /// Options with default temperature and token budget
    pub fn new(model: impl Into<ModelId>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_BRANCH_MAX_TOKENS,
        }
    }

    /// Set the temperature, clamped to `[0, 1]`
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = clamp_temperature(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Clamp a temperature into `[0, 1]`; NaN maps to the default.
pub fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        DEFAULT_TEMPERATURE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Token accounting reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Successful output of one backend call
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}
