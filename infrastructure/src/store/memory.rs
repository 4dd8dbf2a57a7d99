use async_trait::async_trait;
use ensemble_application::{StoreError, TranscriptStore};
use ensemble_domain::{DEFAULT_TRANSCRIPT_CAPACITY, SessionKey, Transcript, Turn, TurnId};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Process-local transcript store; contents are lost on exit
pub struct InMemoryTranscriptStore {
    capacity: usize,
    transcripts: RwLock<HashMap<SessionKey, Transcript>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRANSCRIPT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            transcripts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn append(&self, key: &SessionKey, turn: Turn) -> Result<(), StoreError> {
        let mut transcripts = self
            .transcripts
            .write()
            .map_err(|e| StoreError::WriteFailure(e.to_string()))?;
        let evicted = transcripts
            .entry(key.clone())
            .or_insert_with(|| Transcript::new(self.capacity))
            .append(turn)?;
        if !evicted.is_empty() {
            debug!("Evicted {} turn(s) from {}", evicted.len(), key);
        }
        Ok(())
    }

    async fn list(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError> {
        let transcripts = self
            .transcripts
            .read()
            .map_err(|e| StoreError::ReadFailure(e.to_string()))?;
        Ok(transcripts
            .get(key)
            .map(Transcript::recent_first)
            .unwrap_or_default())
    }

    async fn remove(&self, key: &SessionKey, turn_id: &TurnId) -> Result<bool, StoreError> {
        let mut transcripts = self
            .transcripts
            .write()
            .map_err(|e| StoreError::WriteFailure(e.to_string()))?;
        Ok(transcripts
            .get_mut(key)
            .and_then(|t| t.remove(turn_id))
            .is_some())
    }
}
