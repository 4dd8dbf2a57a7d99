//! Transcript store port
//!
//! Append-only, capacity-bounded persistence of finished turns per session.

use async_trait::async_trait;
use ensemble_domain::{SessionKey, TranscriptError, Turn, TurnId};
use thiserror::Error;

/// Errors that can occur during transcript store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("Read failure: {0}")]
    ReadFailure(String),

    #[error("Turn {0} is not terminal and cannot be persisted")]
    NotTerminal(TurnId),
}

impl From<TranscriptError> for StoreError {
    fn from(e: TranscriptError) -> Self {
        match e {
            TranscriptError::NotTerminal(id) => StoreError::NotTerminal(id),
        }
    }
}

impl StoreError {
    /// Whether retrying the same operation might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::WriteFailure(_))
    }
}

/// Persistence contract for transcripts
///
/// Durable (identity-keyed) and ephemeral (device-keyed) implementations
/// must behave identically:
///
/// - `append` rejects non-terminal turns and evicts the oldest turns beyond
///   the capacity; re-appending a turn id replaces it instead of duplicating
/// - `list` returns at most the capacity, most recent first
/// - `remove` reports whether a turn was removed
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn append(&self, key: &SessionKey, turn: Turn) -> Result<(), StoreError>;

    async fn list(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError>;

    async fn remove(&self, key: &SessionKey, turn_id: &TurnId) -> Result<bool, StoreError>;
}
