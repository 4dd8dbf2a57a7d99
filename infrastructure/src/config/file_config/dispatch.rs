//! Dispatch configuration from TOML (`[dispatch]` section)

use ensemble_application::DispatchParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Per-branch deadline in seconds
    pub timeout_seconds: u64,
    /// Start delay added per branch index, in milliseconds
    pub stagger_ms: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// Token budget for each primary answer
    pub branch_max_tokens: u32,
    /// Longest accepted user message, in characters
    pub max_message_chars: usize,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        let params = DispatchParams::default();
        Self {
            timeout_seconds: params.branch_timeout.as_secs(),
            stagger_ms: params.stagger_step.as_millis() as u64,
            jitter_min_ms: params.jitter_min.as_millis() as u64,
            jitter_max_ms: params.jitter_max.as_millis() as u64,
            branch_max_tokens: params.branch_max_tokens,
            max_message_chars: params.max_message_chars,
        }
    }
}

impl FileDispatchConfig {
    pub fn to_params(&self) -> DispatchParams {
        DispatchParams::default()
            .with_branch_timeout(Duration::from_secs(self.timeout_seconds))
            .with_stagger_step(Duration::from_millis(self.stagger_ms))
            .with_jitter(
                Duration::from_millis(self.jitter_min_ms),
                Duration::from_millis(self.jitter_max_ms),
            )
            .with_branch_max_tokens(self.branch_max_tokens)
            .with_max_message_chars(self.max_message_chars)
    }
}
