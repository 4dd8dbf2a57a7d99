//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod dispatch;
mod ensemble;
mod fusion;
mod output;
mod providers;
mod transcript;

pub use dispatch::FileDispatchConfig;
pub use ensemble::FileEnsembleConfig;
pub use fusion::FileFusionConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use providers::{FileCerebrasConfig, FileGeminiConfig, FileProvidersConfig};
pub use transcript::FileTranscriptConfig;

use ensemble_application::{EnsembleConfig, MAX_SELECTION, MIN_SELECTION};
use ensemble_domain::ModelRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    Zero { field: &'static str },

    #[error("dispatch.jitter_min_ms ({min}) is greater than dispatch.jitter_max_ms ({max})")]
    InvertedJitter { min: u64, max: u64 },

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("ensemble.selection must name 2 to 3 distinct primary models: {0}")]
    InvalidSelection(String),

    #[error("'{0}' is not a synthesis model")]
    NotSynthesis(String),

    #[error("temperature for '{model}' must be within [0, 1], got {value}")]
    InvalidTemperature { model: String, value: f32 },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Backend selection, synthesis model and temperatures
    pub ensemble: FileEnsembleConfig,
    /// Branch scheduling
    pub dispatch: FileDispatchConfig,
    /// Synthesis call limits
    pub fusion: FileFusionConfig,
    /// History capacity and persistence
    pub transcript: FileTranscriptConfig,
    /// Provider endpoints and credentials
    pub providers: FileProvidersConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration against the model registry,
    /// returning every problem found.
    pub fn validate(&self, registry: &ModelRegistry) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("dispatch.timeout_seconds", self.dispatch.timeout_seconds),
            ("fusion.timeout_seconds", self.fusion.timeout_seconds),
            ("dispatch.branch_max_tokens", self.dispatch.branch_max_tokens as u64),
            ("dispatch.max_message_chars", self.dispatch.max_message_chars as u64),
            ("fusion.max_tokens", self.fusion.max_tokens as u64),
            ("transcript.capacity", self.transcript.capacity as u64),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::Zero { field });
            }
        }

        if self.dispatch.jitter_min_ms > self.dispatch.jitter_max_ms {
            errors.push(ConfigValidationError::InvertedJitter {
                min: self.dispatch.jitter_min_ms,
                max: self.dispatch.jitter_max_ms,
            });
        }

        if let Some(selection) = &self.ensemble.selection {
            errors.extend(validate_selection(selection, registry));
        }

        if let Some(model) = &self.ensemble.synthesis_model {
            match registry.describe(model.trim()) {
                _ if model.trim().is_empty() => errors.push(ConfigValidationError::EmptyModelName),
                None => errors.push(ConfigValidationError::UnknownModel(model.clone())),
                Some(d) if !d.is_synthesis() => {
                    errors.push(ConfigValidationError::NotSynthesis(model.clone()))
                }
                Some(_) => {}
            }
        }

        for (model, &value) in &self.ensemble.temperatures {
            if registry.describe(model).is_none() {
                errors.push(ConfigValidationError::UnknownModel(model.clone()));
            }
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigValidationError::InvalidTemperature {
                    model: model.clone(),
                    value,
                });
            }
        }

        errors
    }

    /// Application parameters derived from the `[dispatch]`, `[fusion]` and
    /// `[transcript]` sections
    pub fn to_ensemble_config(&self) -> EnsembleConfig {
        EnsembleConfig::default()
            .with_dispatch(self.dispatch.to_params())
            .with_fusion(
                self.fusion
                    .to_params(self.ensemble.synthesis_model.as_deref().map(str::trim)),
            )
            .with_persistence(self.transcript.to_params())
    }
}

fn validate_selection(selection: &[String], registry: &ModelRegistry) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if !(MIN_SELECTION..=MAX_SELECTION).contains(&selection.len()) {
        errors.push(ConfigValidationError::InvalidSelection(format!(
            "{} models",
            selection.len()
        )));
    }

    for (i, id) in selection.iter().map(|s| s.trim()).enumerate() {
        if id.is_empty() {
            errors.push(ConfigValidationError::EmptyModelName);
            continue;
        }
        if selection[..i].iter().any(|s| s.trim() == id) {
            errors.push(ConfigValidationError::InvalidSelection(format!(
                "'{}' listed twice",
                id
            )));
        }
        match registry.describe(id) {
            None => errors.push(ConfigValidationError::UnknownModel(id.to_string())),
            Some(d) if !d.is_primary() => errors.push(ConfigValidationError::InvalidSelection(
                format!("'{}' is a synthesis model", id),
            )),
            Some(_) => {}
        }
    }

    errors
}
