//! Transcript store adapters
//!
//! - [`InMemoryTranscriptStore`]: ephemeral, for device-keyed sessions
//! - [`JsonFileTranscriptStore`]: durable, one JSON file per session
//! - [`PolicyRoutedStore`]: picks one of the two from the key's policy

mod json_file;
mod memory;

pub use json_file::JsonFileTranscriptStore;
pub use memory::InMemoryTranscriptStore;

use async_trait::async_trait;
use ensemble_application::{StoreError, TranscriptStore};
use ensemble_domain::{SessionKey, StorePolicy, Turn, TurnId};
use std::sync::Arc;

/// Routes identity keys to the durable store and device keys to the
/// ephemeral one
pub struct PolicyRoutedStore {
    durable: Arc<dyn TranscriptStore>,
    ephemeral: Arc<dyn TranscriptStore>,
}

impl PolicyRoutedStore {
    pub fn new(durable: Arc<dyn TranscriptStore>, ephemeral: Arc<dyn TranscriptStore>) -> Self {
        Self { durable, ephemeral }
    }

    fn store_for(&self, key: &SessionKey) -> &dyn TranscriptStore {
        match key.policy() {
            StorePolicy::Durable => self.durable.as_ref(),
            StorePolicy::Ephemeral => self.ephemeral.as_ref(),
        }
    }
}

#[async_trait]
impl TranscriptStore for PolicyRoutedStore {
    async fn append(&self, key: &SessionKey, turn: Turn) -> Result<(), StoreError> {
        self.store_for(key).append(key, turn).await
    }

    async fn list(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError> {
        self.store_for(key).list(key).await
    }

    async fn remove(&self, key: &SessionKey, turn_id: &TurnId) -> Result<bool, StoreError> {
        self.store_for(key).remove(key, turn_id).await
    }
}
