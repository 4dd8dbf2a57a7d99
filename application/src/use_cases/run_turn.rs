//! Run Turn use case
//!
//! The session controller: owns the [`SessionContext`] and drives each turn
//! through dispatch, fusion and persistence.

use crate::config::{EnsembleConfig, PersistenceParams};
use crate::ports::backend::BackendAdapter;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{NoProgress, TurnProgressNotifier};
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use crate::use_cases::dispatch_turn::{DispatchError, TurnDispatcher};
use crate::use_cases::synthesize::{FusionSynthesizer, contributions};
use ensemble_domain::{
    DomainError, ModelId, ModelRegistry, SessionContext, SessionKey, Turn, TurnId, UserMessage,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors that can occur while running a turn
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The turn finished but could not be written to the transcript.
    /// The finished turn is returned so the caller can still show it.
    #[error("Turn {turn_id} could not be persisted: {source}")]
    PersistenceFailed {
        turn_id: TurnId,
        turn: Box<Turn>,
        #[source]
        source: StoreError,
    },

    #[error("Transcript store error: {0}")]
    Store(#[from] StoreError),

    #[error("Turn aborted: {0}")]
    Aborted(String),
}

impl RunTurnError {
    /// The finished turn carried by a persistence failure
    pub fn unpersisted_turn(&self) -> Option<&Turn> {
        match self {
            RunTurnError::PersistenceFailed { turn, .. } => Some(turn),
            _ => None,
        }
    }
}

/// Handle to a turn in flight
///
/// Dropping the handle (or calling [`detach`](Self::detach)) leaves the turn
/// running to completion, including persistence.
pub struct TurnHandle {
    turn_id: TurnId,
    updates: watch::Receiver<Turn>,
    task: JoinHandle<Result<Turn, RunTurnError>>,
}

impl TurnHandle {
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    /// Receiver that sees every branch and fusion update of this turn
    pub fn updates(&self) -> watch::Receiver<Turn> {
        self.updates.clone()
    }

    pub fn snapshot(&self) -> Turn {
        self.updates.borrow().clone()
    }

    /// Wait for the persisted, terminal turn
    pub async fn completed(self) -> Result<Turn, RunTurnError> {
        self.task
            .await
            .map_err(|e| RunTurnError::Aborted(e.to_string()))?
    }

    /// Stop observing; the turn keeps running in the background
    pub fn detach(self) {
        debug!("Detached from turn {}", self.turn_id);
    }
}

/// Session controller
pub struct EnsembleSession {
    context: SessionContext,
    backend: Arc<dyn BackendAdapter>,
    store: Arc<dyn TranscriptStore>,
    registry: Arc<ModelRegistry>,
    config: EnsembleConfig,
    progress: Arc<dyn TurnProgressNotifier>,
    logger: Arc<dyn ConversationLogger>,
}

impl EnsembleSession {
    /// `backend` serves both the primary branches and the synthesis call
    pub fn new(
        context: SessionContext,
        backend: Arc<dyn BackendAdapter>,
        store: Arc<dyn TranscriptStore>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            context,
            backend,
            store,
            registry,
            config: EnsembleConfig::default(),
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_config(mut self, config: EnsembleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn TurnProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    fn dispatcher(&self) -> TurnDispatcher {
        TurnDispatcher::new(Arc::clone(&self.backend), Arc::clone(&self.registry))
            .with_params(self.config.dispatch.clone())
            .with_progress(Arc::clone(&self.progress))
            .with_logger(Arc::clone(&self.logger))
    }

    /// Start a turn and return immediately.
    ///
    /// The message is validated and the selection and temperatures are
    /// snapshotted before anything is spawned; later changes to the session
    /// do not affect this turn. Must be called from within a Tokio runtime.
    pub fn start_turn(&self, message: &str) -> Result<TurnHandle, RunTurnError> {
        let user_message =
            UserMessage::with_limit(message, self.config.dispatch.max_message_chars)?;
        let snapshot = self.context.snapshot();
        let turn_id = TurnId::generate();

        let mut live = self.dispatcher().dispatch(turn_id, user_message, snapshot)?;
        let updates = live.subscribe();

        let synthesizer = FusionSynthesizer::new(Arc::clone(&self.backend), self.config.fusion.clone());
        let registry = Arc::clone(&self.registry);
        let store = Arc::clone(&self.store);
        let key = self.context.key().clone();
        let persistence = self.config.persistence.clone();
        let progress = Arc::clone(&self.progress);
        let logger = Arc::clone(&self.logger);

        let task = tokio::spawn(async move {
            let settled = live.wait_settled().await;

            let contributions = contributions(&settled, &registry);
            progress.on_fusion_start(contributions.len());
            let outcome = synthesizer
                .synthesize(settled.user_message.content(), &contributions)
                .await;
            info!("Turn {} fusion: {}", turn_id, outcome.status);
            progress.on_fusion_complete(&outcome);
            logger.log(ConversationEvent::fusion_completed(&turn_id, &outcome));

            live.publish(|turn| turn.apply_fusion(outcome));
            let turn = live.snapshot();

            persist(
                store.as_ref(),
                &key,
                turn,
                &persistence,
                progress.as_ref(),
                logger.as_ref(),
            )
            .await
        });

        Ok(TurnHandle {
            turn_id,
            updates,
            task,
        })
    }

    /// Run a turn to completion
    pub async fn ask(&self, message: &str) -> Result<Turn, RunTurnError> {
        self.start_turn(message)?.completed().await
    }

    /// Stored turns for this session, most recent first
    pub async fn turn_history(&self) -> Result<Vec<Turn>, RunTurnError> {
        Ok(self.store.list(self.context.key()).await?)
    }

    /// Remove one turn from this session's transcript
    pub async fn delete_turn(&self, turn_id: &TurnId) -> Result<bool, RunTurnError> {
        let removed = self.store.remove(self.context.key(), turn_id).await?;
        if removed {
            info!("Deleted turn {}", turn_id);
        }
        Ok(removed)
    }

    /// Set the temperature used by future turns for one backend
    pub fn set_temperature(&mut self, backend_id: &str, value: f32) -> Result<(), RunTurnError> {
        if self.registry.describe(backend_id).is_none() {
            return Err(DomainError::UnknownModel(backend_id.to_string()).into());
        }
        self.context.set_temperature(backend_id, value)?;
        Ok(())
    }

    /// Replace the backend selection used by future turns
    pub fn set_selection(&mut self, selection: Vec<ModelId>) -> Result<(), RunTurnError> {
        self.dispatcher().validate_selection(&selection)?;
        self.context.set_selection(selection);
        Ok(())
    }
}

/// Append a terminal turn, retrying transient write failures with linear
/// backoff.
async fn persist(
    store: &dyn TranscriptStore,
    key: &SessionKey,
    turn: Turn,
    params: &PersistenceParams,
    progress: &dyn TurnProgressNotifier,
    logger: &dyn ConversationLogger,
) -> Result<Turn, RunTurnError> {
    let attempts = params.attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.append(key, turn.clone()).await {
            Ok(()) => {
                debug!("Turn {} persisted for {} (attempt {})", turn.turn_id, key, attempt);
                progress.on_turn_persisted(&turn);
                logger.log(ConversationEvent::turn_persisted(&turn, attempt));
                return Ok(turn);
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(
                    "Persisting turn {} failed (attempt {}/{}): {}",
                    turn.turn_id, attempt, attempts, e
                );
                tokio::time::sleep(params.backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Giving up persisting turn {}: {}", turn.turn_id, e);
                return Err(RunTurnError::PersistenceFailed {
                    turn_id: turn.turn_id,
                    turn: Box::new(turn),
                    source: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchParams, FusionParams};
    use crate::use_cases::test_support::{
        MemoryStore, RecordingProgress, SYNTH, ScriptedBackend, ids, registry,
    };
    use ensemble_domain::{BackendFailure, BranchStatus, FusionStatus};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn session(
        backend: Arc<ScriptedBackend>,
        store: Arc<MemoryStore>,
        selection: &[&str],
    ) -> EnsembleSession {
        let context =
            SessionContext::new(SessionKey::device("device-1")).with_selection(ids(selection));
        EnsembleSession::new(context, backend, store, Arc::new(registry())).with_config(
            EnsembleConfig::default()
                .with_dispatch(DispatchParams::immediate())
                .with_fusion(FusionParams::default().with_synthesis_model(SYNTH)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_branch_times_out_and_fusion_still_runs() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 100, "x")
                .respond("b", 60_000, "late")
                .respond(SYNTH, 10, "fused"),
        );
        let store = Arc::new(MemoryStore::new());
        let session = session(backend.clone(), store.clone(), &["a", "b"]);

        let turn = session.ask("What is Rust?").await.unwrap();

        assert_eq!(turn.branches[0].status, BranchStatus::Succeeded);
        assert!(turn.branches[1].error.as_ref().unwrap().is_timeout());
        assert_eq!(turn.fusion_status, FusionStatus::Synthesized);
        assert_eq!(turn.fused_answer.as_deref(), Some("fused"));

        let prompt = &backend.calls_for(SYNTH)[0].prompt;
        assert!(prompt.contains("Model 1 (Alpha): x"));
        assert!(!prompt.contains("Model 2"));

        let history = session.turn_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], turn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_branches_fail_is_unavailable_without_synthesis() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .fail("a", 10, BackendFailure::Unauthorized("bad key".to_string()))
                .fail("b", 10, BackendFailure::NetworkError("down".to_string()))
                .respond(SYNTH, 0, "never"),
        );
        let session = session(backend.clone(), Arc::new(MemoryStore::new()), &["a", "b"]);

        let turn = session.ask("q").await.unwrap();

        assert_eq!(turn.fusion_status, FusionStatus::Unavailable);
        assert!(turn.fused_answer.is_none());
        assert!(backend.calls_for(SYNTH).is_empty());
        assert_eq!(session.turn_history().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesis_failure_concatenates_in_selection_order() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 300, "x")
                .fail("b", 10, BackendFailure::Timeout("t".to_string()))
                .respond("c", 100, "z")
                .fail(SYNTH, 0, BackendFailure::MalformedResponse("?".to_string())),
        );
        let session = session(backend, Arc::new(MemoryStore::new()), &["a", "b", "c"]);

        let turn = session.ask("q").await.unwrap();

        assert_eq!(turn.fusion_status, FusionStatus::FallbackConcatenated);
        assert_eq!(turn.fused_answer.as_deref(), Some("x\n\n---\n\nz"));
        assert!(turn.fusion_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fusion_waits_for_every_branch() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 5_000, "slow")
                .respond("b", 10, "fast")
                .respond(SYNTH, 0, "fused"),
        );
        let session = session(backend.clone(), Arc::new(MemoryStore::new()), &["a", "b"]);

        session.ask("q").await.unwrap();

        let slow_done = backend.calls_for("a")[0].at + Duration::from_millis(5_000);
        let synth_at = backend.calls_for(SYNTH)[0].at;
        assert!(synth_at >= slow_done);
        assert!(backend.calls_for(SYNTH)[0].prompt.contains("Model 1 (Alpha): slow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_message_makes_no_calls() {
        let backend = Arc::new(ScriptedBackend::new().respond("a", 0, "x"));
        let session = session(backend.clone(), Arc::new(MemoryStore::new()), &["a", "b"]);

        assert!(matches!(
            session.start_turn("   "),
            Err(RunTurnError::Domain(DomainError::InvalidMessage(_)))
        ));
        assert!(matches!(
            session.start_turn(&"x".repeat(1001)),
            Err(RunTurnError::Domain(DomainError::InvalidMessage(_)))
        ));
        tokio::task::yield_now().await;
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_selection_surfaces_before_dispatch() {
        let backend = Arc::new(ScriptedBackend::new().respond("a", 0, "x"));
        let session = session(backend.clone(), Arc::new(MemoryStore::new()), &["a"]);

        assert!(matches!(
            session.start_turn("q"),
            Err(RunTurnError::Dispatch(DispatchError::InvalidSelection(_)))
        ));
        tokio::task::yield_now().await;
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_temperature_is_snapshotted_at_start() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 10, "x")
                .respond("b", 10, "y")
                .respond(SYNTH, 0, "f"),
        );
        let mut session = session(backend.clone(), Arc::new(MemoryStore::new()), &["a", "b"]);
        session.set_temperature("a", 0.3).unwrap();

        let handle = session.start_turn("q").unwrap();
        session.set_temperature("a", 0.9).unwrap();
        handle.completed().await.unwrap();

        assert_eq!(backend.calls_for("a")[0].options.temperature, 0.3);
        assert_eq!(backend.calls_for("b")[0].options.temperature, 0.7);

        session.ask("again").await.unwrap();
        assert_eq!(backend.calls_for("a")[1].options.temperature, 0.9);
    }

    #[test]
    fn test_set_temperature_rejects_unknown_and_out_of_range() {
        let mut session = session(
            Arc::new(ScriptedBackend::new()),
            Arc::new(MemoryStore::new()),
            &["a", "b"],
        );

        assert!(matches!(
            session.set_temperature("nope", 0.5),
            Err(RunTurnError::Domain(DomainError::UnknownModel(_)))
        ));
        assert!(matches!(
            session.set_temperature("a", 1.5),
            Err(RunTurnError::Domain(DomainError::InvalidTemperature { .. }))
        ));
    }

    #[test]
    fn test_set_selection_is_validated() {
        let mut session = session(
            Arc::new(ScriptedBackend::new()),
            Arc::new(MemoryStore::new()),
            &["a", "b"],
        );

        assert!(session.set_selection(ids(&["a", SYNTH])).is_err());
        assert_eq!(session.context().selection(), ids(&["a", "b"]).as_slice());

        session.set_selection(ids(&["c", "d", "a"])).unwrap();
        assert_eq!(session.context().selection(), ids(&["c", "d", "a"]).as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_turn_still_persists() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 100, "x")
                .respond("b", 200, "y")
                .respond(SYNTH, 50, "f"),
        );
        let progress = Arc::new(RecordingProgress::default());
        let session = session(backend.clone(), Arc::new(MemoryStore::new()), &["a", "b"])
            .with_progress(progress.clone());

        session.start_turn("q").unwrap().detach();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(backend.completed(), 3);
        assert_eq!(progress.persisted.load(Ordering::SeqCst), 1);
        let history = session.turn_history().await.unwrap();
        assert_eq!(history[0].fused_answer.as_deref(), Some("f"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_show_partial_then_fused_turn() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 1_000, "x")
                .respond("b", 10, "y")
                .respond(SYNTH, 10, "f"),
        );
        let session = session(backend, Arc::new(MemoryStore::new()), &["a", "b"]);

        let handle = session.start_turn("q").unwrap();
        let mut updates = handle.updates();

        let partial = updates
            .wait_for(|t| t.branches[1].is_terminal())
            .await
            .unwrap()
            .clone();
        assert!(!partial.branches[0].is_terminal());
        assert_eq!(partial.fusion_status, FusionStatus::Pending);

        let fused = updates
            .wait_for(|t| t.fusion_status.is_terminal())
            .await
            .unwrap()
            .clone();
        assert_eq!(fused.fused_answer.as_deref(), Some("f"));

        handle.completed().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_store_failures_are_retried() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 0, "x")
                .respond("b", 0, "y")
                .respond(SYNTH, 0, "f"),
        );
        let store = Arc::new(MemoryStore::failing(2));
        let session = session(backend, store.clone(), &["a", "b"]);

        let turn = session.ask("q").await.unwrap();

        assert_eq!(store.append_calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.turn_history().await.unwrap(), vec![turn]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_returns_finished_turn() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 0, "x")
                .respond("b", 0, "y")
                .respond(SYNTH, 0, "f"),
        );
        let store = Arc::new(MemoryStore::failing(10));
        let session = session(backend, store.clone(), &["a", "b"]);

        let err = session.ask("q").await.unwrap_err();

        assert_eq!(store.append_calls.load(Ordering::SeqCst), 3);
        let turn = err.unpersisted_turn().unwrap();
        assert!(turn.is_terminal());
        assert_eq!(turn.fused_answer.as_deref(), Some("f"));
        assert!(session.turn_history().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_is_most_recent_first_and_delete() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .respond("a", 0, "x")
                .respond("b", 0, "y")
                .respond(SYNTH, 0, "f"),
        );
        let session = session(backend, Arc::new(MemoryStore::new()), &["a", "b"]);

        let first = session.ask("first").await.unwrap();
        let second = session.ask("second").await.unwrap();

        let history = session.turn_history().await.unwrap();
        let messages: Vec<&str> = history.iter().map(|t| t.user_message.content()).collect();
        assert_eq!(messages, vec!["second", "first"]);

        assert!(session.delete_turn(&first.turn_id).await.unwrap());
        assert!(!session.delete_turn(&first.turn_id).await.unwrap());
        let history = session.turn_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].turn_id, second.turn_id);
    }
}
