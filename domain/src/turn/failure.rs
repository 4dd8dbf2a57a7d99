//! Typed backend failures
//!
//! A closed set of causes so callers can distinguish, say, rate limiting
//! from a malformed payload without matching on strings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Why a single backend call failed
///
/// Failures are branch-local: they are recorded on the
/// [`Branch`](crate::turn::branch::Branch) and never abort the turn.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum BackendFailure {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl BackendFailure {
    /// Timeout failure for an exceeded deadline
    pub fn deadline_exceeded(deadline: Duration) -> Self {
        BackendFailure::Timeout(format!("no response within {}ms", deadline.as_millis()))
    }

    /// Short machine-readable kind, matching the serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            BackendFailure::Unauthorized(_) => "unauthorized",
            BackendFailure::RateLimited(_) => "rateLimited",
            BackendFailure::MalformedResponse(_) => "malformedResponse",
            BackendFailure::NetworkError(_) => "networkError",
            BackendFailure::Timeout(_) => "timeout",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendFailure::Timeout(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, BackendFailure::RateLimited(_))
    }
}
