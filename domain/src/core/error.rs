//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are precondition failures raised before any backend is contacted.
/// Branch-local backend failures are modelled separately by
/// [`BackendFailure`](crate::turn::failure::BackendFailure) because they never
/// abort a turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid temperature {value} for {model}: must be within [0, 1]")]
    InvalidTemperature { model: String, value: f32 },
}

impl DomainError {
    /// Check if this error is a rejected backend selection
    pub fn is_invalid_selection(&self) -> bool {
        matches!(self, DomainError::InvalidSelection(_))
    }
}
