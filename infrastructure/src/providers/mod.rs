//! HTTP backend adapters
//!
//! One [`BackendAdapter`](ensemble_application::BackendAdapter) per provider
//! API, plus a [`RoutingBackend`] that picks the adapter from the model's
//! registry descriptor.

pub mod cerebras;
pub mod gemini;
pub mod routing;

pub use cerebras::CerebrasAdapter;
pub use gemini::GeminiAdapter;
pub use routing::RoutingBackend;

use ensemble_domain::{BackendFailure, ProviderKind};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Transport-level safety net; the dispatcher enforces the real deadline.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while constructing an adapter
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No API key for {provider}: set {env_var} or providers.{provider}.api_key")]
    MissingApiKey {
        provider: ProviderKind,
        env_var: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Map a non-2xx response to a typed failure.
///
/// 401/403 are auth problems, 429 is rate limiting, everything else is
/// reported as a network error carrying the provider's message.
pub(crate) fn failure_from_status(status: StatusCode, body: &str) -> BackendFailure {
    let message = format!("HTTP {}: {}", status.as_u16(), error_message(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendFailure::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => BackendFailure::RateLimited(message),
        _ => BackendFailure::NetworkError(message),
    }
}

/// Map a transport error to a typed failure
pub(crate) fn failure_from_transport(err: &reqwest::Error) -> BackendFailure {
    if err.is_timeout() {
        BackendFailure::Timeout(err.to_string())
    } else if err.is_decode() {
        BackendFailure::MalformedResponse(err.to_string())
    } else {
        BackendFailure::NetworkError(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Both providers wrap errors as `{"error": {"message": ...}}`
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| w.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}
