//! Transcript configuration from TOML (`[transcript]` section)

use ensemble_application::PersistenceParams;
use ensemble_domain::DEFAULT_TRANSCRIPT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTranscriptConfig {
    /// Turns kept per session
    pub capacity: usize,
    /// Total write attempts before a persistence failure is reported
    pub persist_attempts: u32,
    pub persist_backoff_ms: u64,
    /// Directory for durable transcripts (default: platform data dir)
    pub data_dir: Option<String>,
}

impl Default for FileTranscriptConfig {
    fn default() -> Self {
        let params = PersistenceParams::default();
        Self {
            capacity: DEFAULT_TRANSCRIPT_CAPACITY,
            persist_attempts: params.attempts,
            persist_backoff_ms: params.backoff.as_millis() as u64,
            data_dir: None,
        }
    }
}

impl FileTranscriptConfig {
    pub fn to_params(&self) -> PersistenceParams {
        PersistenceParams::default()
            .with_attempts(self.persist_attempts)
            .with_backoff(Duration::from_millis(self.persist_backoff_ms))
    }

    /// Resolved durable transcript directory
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prudence-ensemble")
                .join("transcripts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileTranscriptConfig::default();
        assert_eq!(config.capacity, 20);
        assert_eq!(config.to_params(), PersistenceParams::default());
        assert!(config.data_dir().ends_with("prudence-ensemble/transcripts"));
    }

    #[test]
    fn test_explicit_data_dir() {
        let config = FileTranscriptConfig {
            data_dir: Some("/tmp/ensemble".to_string()),
            ..Default::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/ensemble"));
    }
}
