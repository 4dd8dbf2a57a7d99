//! Dispatch parameters: branch scheduling and deadlines.
//!
//! [`DispatchParams`] controls how the
//! [`TurnDispatcher`](crate::use_cases::dispatch_turn::TurnDispatcher) launches
//! and bounds each branch.

use ensemble_domain::{DEFAULT_BRANCH_MAX_TOKENS, DEFAULT_MAX_MESSAGE_CHARS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum number of backends in an ensemble selection.
pub const MIN_SELECTION: usize = 2;
/// Maximum number of backends in an ensemble selection.
pub const MAX_SELECTION: usize = 3;

/// Branch scheduling parameters.
///
/// Branch *i* starts after `i × stagger_step` plus a uniform jitter drawn
/// from `[jitter_min, jitter_max]`. The stagger only spreads load; nothing
/// depends on it for correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Deadline for a single backend call.
    pub branch_timeout: Duration,
    /// Per-index start delay.
    pub stagger_step: Duration,
    /// Lower bound of the random start jitter.
    pub jitter_min: Duration,
    /// Upper bound of the random start jitter.
    pub jitter_max: Duration,
    /// Token budget for each primary branch.
    pub branch_max_tokens: u32,
    /// Maximum user message length in characters.
    pub max_message_chars: usize,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            branch_timeout: Duration::from_secs(30),
            stagger_step: Duration::from_millis(500),
            jitter_min: Duration::from_millis(1000),
            jitter_max: Duration::from_millis(3000),
            branch_max_tokens: DEFAULT_BRANCH_MAX_TOKENS,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

impl DispatchParams {
    /// No stagger and no jitter: every branch starts immediately.
    pub fn immediate() -> Self {
        Self {
            stagger_step: Duration::ZERO,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            ..Self::default()
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_branch_timeout(mut self, timeout: Duration) -> Self {
        self.branch_timeout = timeout;
        self
    }

    pub fn with_stagger_step(mut self, step: Duration) -> Self {
        self.stagger_step = step;
        self
    }

    /// Set the jitter range; bounds are swapped if given in reverse.
    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.jitter_min = min.min(max);
        self.jitter_max = min.max(max);
        self
    }

    pub fn with_branch_max_tokens(mut self, max_tokens: u32) -> Self {
        self.branch_max_tokens = max_tokens;
        self
    }

    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    /// Start delay for the branch at `index`, given a jitter sample in `[0, 1]`.
    pub fn start_delay(&self, index: usize, jitter_sample: f64) -> Duration {
        let stagger = self.stagger_step.saturating_mul(index as u32);
        let span = self.jitter_max.saturating_sub(self.jitter_min);
        let jitter = self.jitter_min + span.mul_f64(jitter_sample.clamp(0.0, 1.0));
        stagger + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = DispatchParams::default();
        assert_eq!(params.branch_timeout, Duration::from_secs(30));
        assert_eq!(params.stagger_step, Duration::from_millis(500));
        assert_eq!(params.branch_max_tokens, 1000);
        assert_eq!(params.max_message_chars, 1000);
    }

    #[test]
    fn test_start_delay_bounds() {
        let params = DispatchParams::default();
        assert_eq!(params.start_delay(0, 0.0), Duration::from_millis(1000));
        assert_eq!(params.start_delay(0, 1.0), Duration::from_millis(3000));
        assert_eq!(params.start_delay(2, 0.5), Duration::from_millis(3000));
    }

    #[test]
    fn test_immediate_has_no_delay() {
        let params = DispatchParams::immediate();
        assert_eq!(params.start_delay(2, 0.9), Duration::ZERO);
    }

    #[test]
    fn test_with_jitter_orders_bounds() {
        let params = DispatchParams::default()
            .with_jitter(Duration::from_millis(50), Duration::from_millis(10));
        assert_eq!(params.jitter_min, Duration::from_millis(10));
        assert_eq!(params.jitter_max, Duration::from_millis(50));
    }
}
