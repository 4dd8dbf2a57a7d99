//! Dispatch Turn use case
//!
//! Fans one user message out to the selected backends and collects their
//! answers into a live [`Turn`].
//!
//! Every branch runs as its own task inside a `JoinSet` owned by a detached
//! driver task. Branch slots are allocated up front in selection order and
//! each branch writes only its own slot of a `watch` channel, so completion
//! order never reorders the turn. The driver joins every branch before the
//! turn is reported settled; that join is the only gate for fusion.

use crate::config::{DispatchParams, MAX_SELECTION, MIN_SELECTION};
use crate::ports::backend::BackendAdapter;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{NoProgress, TurnProgressNotifier};
use ensemble_domain::{
    BackendFailure, DispatchOptions, DispatchSnapshot, ModelId, ModelRegistry, Turn, TurnId,
    UserMessage,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Errors that can occur before a turn is dispatched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

/// A turn whose branches are still resolving
///
/// Dropping a `LiveTurn` abandons interest in its updates only: the driver
/// task and every backend call already issued keep running.
pub struct LiveTurn {
    turn_id: TurnId,
    state: Arc<watch::Sender<Turn>>,
    settled: Option<JoinHandle<()>>,
}

impl LiveTurn {
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    /// Receiver that observes every in-place branch update
    pub fn subscribe(&self) -> watch::Receiver<Turn> {
        self.state.subscribe()
    }

    /// Current state of the turn
    pub fn snapshot(&self) -> Turn {
        self.state.borrow().clone()
    }

    /// Wait until every branch is terminal and return the settled turn.
    ///
    /// Calling this again after it returned yields the current snapshot.
    pub async fn wait_settled(&mut self) -> Turn {
        if let Some(handle) = self.settled.take()
            && let Err(e) = handle.await
        {
            warn!("Dispatch driver for turn {} ended abnormally: {}", self.turn_id, e);
            self.state.send_modify(|turn| resolve_stragglers(turn, "dispatch driver aborted"));
        }
        self.snapshot()
    }

    /// Apply a change to the live turn and notify subscribers
    pub(crate) fn publish(&self, update: impl FnOnce(&mut Turn)) {
        self.state.send_modify(update);
    }
}

/// Turn dispatcher: one branch per selected backend, joined by a barrier
pub struct TurnDispatcher {
    backend: Arc<dyn BackendAdapter>,
    registry: Arc<ModelRegistry>,
    params: DispatchParams,
    progress: Arc<dyn TurnProgressNotifier>,
    logger: Arc<dyn ConversationLogger>,
}

impl TurnDispatcher {
    pub fn new(backend: Arc<dyn BackendAdapter>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            backend,
            registry,
            params: DispatchParams::default(),
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_params(mut self, params: DispatchParams) -> Self {
        self.params = params;
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

    pub fn params(&self) -> &DispatchParams {
        &self.params
    }

    /// Check that a selection can be dispatched: 2 to 3 distinct, known,
    /// primary-family backends.
    pub fn validate_selection(&self, selection: &[ModelId]) -> Result<(), DispatchError> {
        if !(MIN_SELECTION..=MAX_SELECTION).contains(&selection.len()) {
            return Err(DispatchError::InvalidSelection(format!(
                "ensemble mode needs {} to {} backends, got {}",
                MIN_SELECTION,
                MAX_SELECTION,
                selection.len()
            )));
        }

        for (i, id) in selection.iter().enumerate() {
            if selection[..i].contains(id) {
                return Err(DispatchError::InvalidSelection(format!(
                    "{} is selected more than once",
                    id
                )));
            }
            match self.registry.describe(id.as_str()) {
                None => {
                    return Err(DispatchError::InvalidSelection(format!(
                        "unknown backend: {}",
                        id
                    )));
                }
                Some(descriptor) if !descriptor.is_primary() => {
                    return Err(DispatchError::InvalidSelection(format!(
                        "{} is a {} backend and cannot answer directly",
                        id, descriptor.family
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Dispatch a turn.
    ///
    /// Validation happens before anything is spawned, so an invalid selection
    /// performs zero backend calls. Must be called from within a Tokio
    /// runtime.
    pub fn dispatch(
        &self,
        turn_id: TurnId,
        user_message: UserMessage,
        snapshot: DispatchSnapshot,
    ) -> Result<LiveTurn, DispatchError> {
        self.validate_selection(&snapshot.selection)?;

        info!(
            "Dispatching turn {} to {} backends",
            turn_id,
            snapshot.selection.len()
        );

        let prompt: Arc<str> = Arc::from(user_message.content());
        let turn = Turn::new(turn_id, user_message, &snapshot.selection);
        self.progress.on_turn_start(&turn_id, &snapshot.selection);
        self.logger.log(ConversationEvent::turn_started(&turn));

        let (sender, _) = watch::channel(turn);
        let state = Arc::new(sender);

        let mut join_set = JoinSet::new();
        for (index, backend_id) in snapshot.selection.iter().enumerate() {
            let options = DispatchOptions::new(backend_id.clone())
                .with_temperature(snapshot.temperature_for(backend_id))
                .with_max_tokens(self.params.branch_max_tokens);

            let branch = BranchTask {
                turn_id,
                index,
                prompt: Arc::clone(&prompt),
                options,
                start_delay: self.params.start_delay(index, rand::random::<f64>()),
                deadline: self.params.branch_timeout,
                backend: Arc::clone(&self.backend),
                state: Arc::clone(&state),
                progress: Arc::clone(&self.progress),
                logger: Arc::clone(&self.logger),
            };
            join_set.spawn(branch.run());
        }

        let driver_state = Arc::clone(&state);
        let settled = tokio::spawn(async move {
            while let Some(result) = join_set.join_next().await {
                if let Err(e) = result {
                    warn!("Branch task join error: {}", e);
                }
            }
            driver_state.send_modify(|turn| {
                resolve_stragglers(turn, "branch task ended without a result")
            });
            debug!("All branches of turn {} settled", turn_id);
        });

        Ok(LiveTurn {
            turn_id,
            state,
            settled: Some(settled),
        })
    }
}

/// Fail any branch still pending after its task is gone
fn resolve_stragglers(turn: &mut Turn, reason: &str) {
    for branch in turn.branches.iter_mut().filter(|b| !b.is_terminal()) {
        branch.resolve(Err(BackendFailure::NetworkError(reason.to_string())));
    }
}

/// Everything one branch needs, moved into its task
struct BranchTask {
    turn_id: TurnId,
    index: usize,
    prompt: Arc<str>,
    options: DispatchOptions,
    start_delay: Duration,
    deadline: Duration,
    backend: Arc<dyn BackendAdapter>,
    state: Arc<watch::Sender<Turn>>,
    progress: Arc<dyn TurnProgressNotifier>,
    logger: Arc<dyn ConversationLogger>,
}

impl BranchTask {
    async fn run(self) {
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }

        let index = self.index;
        self.state
            .send_modify(|turn| turn.branches[index].mark_started());
        debug!(
            "Branch {} ({}) calling backend, temperature {}",
            index, self.options.model, self.options.temperature
        );

        let outcome = match tokio::time::timeout(
            self.deadline,
            self.backend.generate(&self.prompt, &self.options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendFailure::deadline_exceeded(self.deadline)),
        };

        match &outcome {
            Ok(generation) => info!(
                "Backend {} responded ({} bytes)",
                self.options.model,
                generation.text.len()
            ),
            Err(failure) => warn!("Backend {} failed: {}", self.options.model, failure),
        }

        let mut resolved = None;
        self.state.send_modify(|turn| {
            let branch = &mut turn.branches[index];
            if branch.resolve(outcome) {
                resolved = Some(branch.clone());
            }
        });

        if let Some(branch) = resolved {
            self.progress.on_branch_complete(index, &branch);
            self.logger.log(ConversationEvent::branch_completed(
                &self.turn_id,
                index,
                &branch,
            ));
        }
    }
}
