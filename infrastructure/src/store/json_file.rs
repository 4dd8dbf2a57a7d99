use async_trait::async_trait;
use ensemble_application::{StoreError, TranscriptStore};
use ensemble_domain::{DEFAULT_TRANSCRIPT_CAPACITY, SessionKey, Transcript, Turn, TurnId};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk layout of one session's transcript
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptFile {
    session: String,
    /// Oldest first
    turns: Vec<Turn>,
}

/// Durable transcript store: one JSON file per session under `dir`.
///
/// Each write goes to its own uniquely named temporary file that is then
/// renamed over the old one, so a crash mid-write leaves the previous
/// transcript intact. Read-modify-write cycles are serialized through a
/// lock that only covers this process; concurrent processes writing the
/// same session can still lose an update, but never corrupt the file.
/// A file whose recorded session differs from the requested key is
/// refused rather than served.
pub struct JsonFileTranscriptStore {
    dir: PathBuf,
    capacity: usize,
    lock: Mutex<()>,
}

impl JsonFileTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_capacity(dir, DEFAULT_TRANSCRIPT_CAPACITY)
    }

    pub fn with_capacity(dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            capacity,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.storage_name()))
    }

    async fn load(&self, key: &SessionKey) -> Result<Transcript, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Transcript::new(self.capacity)),
            Err(e) => {
                return Err(StoreError::ReadFailure(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let file: TranscriptFile = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::ReadFailure(format!("{}: {}", path.display(), e)))?;
        if file.session != key.to_string() {
            return Err(StoreError::ReadFailure(format!(
                "{} belongs to {}, not {}",
                path.display(),
                file.session,
                key
            )));
        }
        Ok(Transcript::from_turns(self.capacity, file.turns))
    }

    async fn save(&self, key: &SessionKey, transcript: &Transcript) -> Result<(), StoreError> {
        let file = TranscriptFile {
            session: key.to_string(),
            turns: transcript.oldest_first().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| StoreError::WriteFailure(e.to_string()))?;

        let dir = self.dir.clone();
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &json))
            .await
            .map_err(|e| StoreError::WriteFailure(e.to_string()))?
            .map_err(|e| StoreError::WriteFailure(e.to_string()))
    }
}

/// Write `bytes` to a fresh temp file in `dir` and rename it onto `path`
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl TranscriptStore for JsonFileTranscriptStore {
    async fn append(&self, key: &SessionKey, turn: Turn) -> Result<(), StoreError> {
        if !turn.is_terminal() {
            return Err(StoreError::NotTerminal(turn.turn_id));
        }

        let _guard = self.lock.lock().await;
        let mut transcript = self.load(key).await?;
        let evicted = transcript.append(turn)?;
        if !evicted.is_empty() {
            debug!("Evicted {} turn(s) from {}", evicted.len(), key);
        }
        self.save(key, &transcript).await
    }

    async fn list(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load(key).await?.recent_first())
    }

    async fn remove(&self, key: &SessionKey, turn_id: &TurnId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut transcript = self.load(key).await?;
        if transcript.remove(turn_id).is_none() {
            return Ok(false);
        }
        self.save(key, &transcript).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::{finished_turn, live_turn};

    #[tokio::test]
    async fn test_turns_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let key = SessionKey::identity("alice@example.com");
        let turn = finished_turn("What is Rust?");

        JsonFileTranscriptStore::new(dir.path())
            .append(&key, turn.clone())
            .await
            .unwrap();

        let reopened = JsonFileTranscriptStore::new(dir.path());
        let turns = reopened.list(&key).await.unwrap();
        assert_eq!(turns, vec![turn]);
        assert!(dir.path().join("users_alice_40example_2ecom.json").exists());
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temp files must not be left behind");
    }

    #[tokio::test]
    async fn test_cap_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::with_capacity(dir.path(), 3);
        let key = SessionKey::identity("bob");

        for i in 0..5 {
            store.append(&key, finished_turn(&format!("m{}", i))).await.unwrap();
        }

        let messages: Vec<String> = store
            .list(&key)
            .await
            .unwrap()
            .iter()
            .map(|t| t.user_message.content().to_string())
            .collect();
        assert_eq!(messages, vec!["m4", "m3", "m2"]);
    }

    #[tokio::test]
    async fn test_reappend_replaces_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path());
        let key = SessionKey::identity("carol");
        let turn = finished_turn("q");

        store.append(&key, turn.clone()).await.unwrap();
        store.append(&key, turn).await.unwrap();

        assert_eq!(store.list(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_live_turn_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path().join("nested"));
        let key = SessionKey::identity("dave");

        let err = store.append(&key, live_turn("q")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotTerminal(_)));
        assert!(!dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path());
        let key = SessionKey::identity("erin");
        let keep = finished_turn("keep");
        let gone = finished_turn("gone");
        let gone_id = gone.turn_id;

        store.append(&key, keep.clone()).await.unwrap();
        store.append(&key, gone).await.unwrap();

        assert!(store.remove(&key, &gone_id).await.unwrap());
        assert!(!store.remove(&key, &gone_id).await.unwrap());
        assert_eq!(store.list(&key).await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_lookalike_identities_keep_separate_transcripts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path());
        let alice = SessionKey::identity("alice@example.com");
        let mallory = SessionKey::identity("alice.example.com");
        let private = finished_turn("alice private question");
        let private_id = private.turn_id;

        store.append(&alice, private.clone()).await.unwrap();

        assert!(store.list(&mallory).await.unwrap().is_empty());
        assert!(!store.remove(&mallory, &private_id).await.unwrap());

        store.append(&mallory, finished_turn("mallory question")).await.unwrap();
        assert_eq!(store.list(&alice).await.unwrap(), vec![private]);
        assert_eq!(store.list(&mallory).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_of_another_session_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path());
        let alice = SessionKey::identity("alice");
        let bob = SessionKey::identity("bob");
        store.append(&alice, finished_turn("q")).await.unwrap();

        std::fs::rename(
            dir.path().join("users_alice.json"),
            dir.path().join("users_bob.json"),
        )
        .unwrap();

        let err = store.list(&bob).await.unwrap_err();
        assert!(matches!(err, StoreError::ReadFailure(_)));
    }

    #[tokio::test]
    async fn test_concurrent_writers_on_one_dir_leave_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let first = JsonFileTranscriptStore::new(dir.path());
        let second = JsonFileTranscriptStore::new(dir.path());
        let key = SessionKey::identity("gina");

        let (a, b) = tokio::join!(
            first.append(&key, finished_turn("one")),
            second.append(&key, finished_turn("two")),
        );
        a.unwrap();
        b.unwrap();

        let turns = first.list(&key).await.unwrap();
        assert!(!turns.is_empty());
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path());
        let key = SessionKey::identity("frank");
        std::fs::write(dir.path().join("users_frank.json"), "not json").unwrap();

        let err = store.list(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::ReadFailure(_)));
    }

    #[tokio::test]
    async fn test_missing_session_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileTranscriptStore::new(dir.path());
        assert!(store.list(&SessionKey::identity("nobody")).await.unwrap().is_empty());
    }
}
