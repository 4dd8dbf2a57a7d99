//! Backend adapter port
//!
//! Defines the single network-facing capability the ensemble core uses:
//! "given a prompt and options, asynchronously produce text or fail".

use async_trait::async_trait;
use ensemble_domain::{BackendFailure, DispatchOptions, Generation};

/// Uniform capability wrapping one model API
///
/// Implementations (adapters) live in the infrastructure layer and hide
/// endpoints, headers and provider payload shapes. Adapters make exactly one
/// attempt per call; retry policy, if any, belongs to the caller. The caller
/// enforces the deadline and may cancel by dropping the future.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Generate a completion for `prompt` using `options.model`
    async fn generate(
        &self,
        prompt: &str,
        options: &DispatchOptions,
    ) -> Result<Generation, BackendFailure>;
}
