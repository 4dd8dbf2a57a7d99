//! Fusion use case
//!
//! Merges the succeeded branches of a settled turn into one answer with a
//! single call to the synthesis backend, degrading to a deterministic
//! concatenation when that call fails.

use crate::config::FusionParams;
use crate::ports::backend::BackendAdapter;
use ensemble_domain::{
    BackendFailure, DispatchOptions, FusionOutcome, ModelRegistry, PromptTemplate, Turn,
};
use std::sync::Arc;
use tracing::{info, warn};

/// `(display name, text)` for each succeeded branch, in selection order
pub fn contributions(turn: &Turn, registry: &ModelRegistry) -> Vec<(String, String)> {
    turn.succeeded_branches()
        .filter_map(|branch| {
            branch.text.as_ref().map(|text| {
                (
                    registry.display_name(branch.backend_id.as_str()).to_string(),
                    text.clone(),
                )
            })
        })
        .collect()
}

pub struct FusionSynthesizer {
    backend: Arc<dyn BackendAdapter>,
    params: FusionParams,
}

impl FusionSynthesizer {
    pub fn new(backend: Arc<dyn BackendAdapter>, params: FusionParams) -> Self {
        Self { backend, params }
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    /// Produce the fused answer for `contributions`.
    ///
    /// - no contributions: `Unavailable`, and the synthesis backend is not called
    /// - synthesis returns non-blank text: `Synthesized`, text kept verbatim
    /// - synthesis fails, times out or returns blank text: `FallbackConcatenated`
    ///
    /// Exactly one synthesis attempt is made; this never fails.
    pub async fn synthesize(
        &self,
        user_message: &str,
        contributions: &[(String, String)],
    ) -> FusionOutcome {
        if contributions.is_empty() {
            info!("No succeeded branches; fusion unavailable");
            return FusionOutcome::unavailable();
        }

        let prompt = PromptTemplate::synthesis_prompt(user_message, contributions);
        let options = DispatchOptions::new(self.params.synthesis_model.clone())
            .with_temperature(self.params.temperature)
            .with_max_tokens(self.params.max_tokens);

        info!(
            "Synthesizing {} responses with {}",
            contributions.len(),
            self.params.synthesis_model
        );

        let result = match tokio::time::timeout(
            self.params.timeout,
            self.backend.generate(&prompt, &options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendFailure::deadline_exceeded(self.params.timeout)),
        };

        match result {
            Ok(generation) if !generation.text.trim().is_empty() => {
                FusionOutcome::synthesized(generation.text)
            }
            Ok(_) => {
                warn!("Synthesis returned an empty answer; concatenating instead");
                self.fallback(
                    contributions,
                    BackendFailure::MalformedResponse("empty synthesis answer".to_string()),
                )
            }
            Err(failure) => {
                warn!("Synthesis failed: {}; concatenating instead", failure);
                self.fallback(contributions, failure)
            }
        }
    }

    fn fallback(&self, contributions: &[(String, String)], failure: BackendFailure) -> FusionOutcome {
        let text = PromptTemplate::fallback_concatenation(
            contributions.iter().map(|(_, text)| text.as_str()),
        );
        FusionOutcome::fallback(text, failure)
    }
}
