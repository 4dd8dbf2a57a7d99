//! Shared mocks for use case tests.

use crate::ports::backend::BackendAdapter;
use crate::ports::progress::TurnProgressNotifier;
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use async_trait::async_trait;
use ensemble_domain::{
    BackendFailure, Branch, DispatchOptions, FusionOutcome, Generation, ModelDescriptor,
    ModelFamily, ModelId, ModelRegistry, ProviderKind, SessionKey, Transcript, Turn, TurnId,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) const SYNTH: &str = "synth";

/// Registry with primary backends `a`..`d` and synthesis backend `synth`
pub(crate) fn registry() -> ModelRegistry {
    ModelRegistry::new([
        ModelDescriptor::new("a", "Alpha", ModelFamily::Primary, ProviderKind::Cerebras),
        ModelDescriptor::new("b", "Beta", ModelFamily::Primary, ProviderKind::Cerebras),
        ModelDescriptor::new("c", "Gamma", ModelFamily::Primary, ProviderKind::Gemini),
        ModelDescriptor::new("d", "Delta", ModelFamily::Primary, ProviderKind::Gemini),
        ModelDescriptor::new(SYNTH, "Synth", ModelFamily::Synthesis, ProviderKind::Gemini),
    ])
}

pub(crate) fn ids(ids: &[&str]) -> Vec<ModelId> {
    ids.iter().map(|s| ModelId::from(*s)).collect()
}

#[derive(Clone)]
struct Script {
    delay: Duration,
    outcome: Result<Generation, BackendFailure>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub prompt: String,
    pub options: DispatchOptions,
    pub at: Instant,
}

/// Backend whose per-model delay and outcome are scripted up front
pub(crate) struct ScriptedBackend {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<RecordedCall>>,
    completed: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn respond(self, model: &str, delay_ms: u64, text: &str) -> Self {
        self.script(model, delay_ms, Ok(Generation::new(text)))
    }

    pub fn fail(self, model: &str, delay_ms: u64, failure: BackendFailure) -> Self {
        self.script(model, delay_ms, Err(failure))
    }

    fn script(self, model: &str, delay_ms: u64, outcome: Result<Generation, BackendFailure>) -> Self {
        self.scripts.lock().unwrap().insert(
            model.to_string(),
            Script {
                delay: Duration::from_millis(delay_ms),
                outcome,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, model: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.options.model.as_str() == model)
            .collect()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendAdapter for ScriptedBackend {
    async fn generate(
        &self,
        prompt: &str,
        options: &DispatchOptions,
    ) -> Result<Generation, BackendFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            options: options.clone(),
            at: Instant::now(),
        });
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(options.model.as_str())
            .cloned();
        let Some(script) = script else {
            return Err(BackendFailure::NetworkError(format!(
                "no script for {}",
                options.model
            )));
        };
        tokio::time::sleep(script.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        script.outcome
    }
}

/// Records the order in which branches complete
#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub completions: Mutex<Vec<(usize, String)>>,
    pub fusion: Mutex<Option<FusionOutcome>>,
    pub persisted: AtomicUsize,
}

impl TurnProgressNotifier for RecordingProgress {
    fn on_turn_start(&self, _turn_id: &TurnId, _selection: &[ModelId]) {}

    fn on_branch_complete(&self, index: usize, branch: &Branch) {
        self.completions
            .lock()
            .unwrap()
            .push((index, branch.backend_id.to_string()));
    }

    fn on_fusion_complete(&self, outcome: &FusionOutcome) {
        *self.fusion.lock().unwrap() = Some(outcome.clone());
    }

    fn on_turn_persisted(&self, _turn: &Turn) {
        self.persisted.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory store that fails the first `failures` appends
pub(crate) struct MemoryStore {
    transcripts: Mutex<HashMap<SessionKey, Transcript>>,
    failures: AtomicUsize,
    pub append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: usize) -> Self {
        Self {
            transcripts: Mutex::new(HashMap::new()),
            failures: AtomicUsize::new(failures),
            append_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn append(&self, key: &SessionKey, turn: Turn) -> Result<(), StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::WriteFailure("injected".to_string()));
        }
        let mut transcripts = self.transcripts.lock().unwrap();
        transcripts.entry(key.clone()).or_default().append(turn)?;
        Ok(())
    }

    async fn list(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError> {
        Ok(self
            .transcripts
            .lock()
            .unwrap()
            .get(key)
            .map(Transcript::recent_first)
            .unwrap_or_default())
    }

    async fn remove(&self, key: &SessionKey, turn_id: &TurnId) -> Result<bool, StoreError> {
        Ok(self
            .transcripts
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|t| t.remove(turn_id))
            .is_some())
    }
}
