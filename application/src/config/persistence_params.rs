//! Persistence parameters: how hard to try writing a finished turn.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for transcript writes.
///
/// A failed append is retried up to `attempts` times in total, sleeping
/// `backoff × attempt` between tries, before the error reaches the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceParams {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for PersistenceParams {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

impl PersistenceParams {
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}
