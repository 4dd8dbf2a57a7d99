//! Fusion parameters: the single synthesis attempt.

use ensemble_domain::{DEFAULT_SYNTHESIS_MODEL, DEFAULT_TEMPERATURE, ModelId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token budget for the synthesis call.
pub const DEFAULT_SYNTHESIS_MAX_TOKENS: u32 = 3000;

/// Parameters for the [`FusionSynthesizer`](crate::use_cases::synthesize::FusionSynthesizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionParams {
    /// Backend used to merge the branch answers.
    pub synthesis_model: ModelId,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Deadline for the synthesis call; on expiry fusion falls back.
    pub timeout: Duration,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            synthesis_model: ModelId::from(DEFAULT_SYNTHESIS_MODEL),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_SYNTHESIS_MAX_TOKENS,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FusionParams {
    pub fn with_synthesis_model(mut self, model: impl Into<ModelId>) -> Self {
        self.synthesis_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
