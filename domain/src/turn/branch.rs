//! Branch: one backend's single attempt within a turn

use crate::core::model::ModelId;
use crate::turn::failure::BackendFailure;
use crate::turn::value_objects::{Generation, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a branch
///
/// ```text
/// Pending ──┬── Succeeded
///           └── Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Pending,
    Succeeded,
    Failed,
}

impl BranchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BranchStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Pending => "pending",
            BranchStatus::Succeeded => "succeeded",
            BranchStatus::Failed => "failed",
        }
    }
}

/// One backend's attempt within a turn
///
/// `text` is present iff the branch succeeded and `error` iff it failed.
/// A branch moves out of `Pending` exactly once and is never reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub backend_id: ModelId,
    pub status: BranchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BackendFailure>,
    pub started_at: DateTime<Utc>,
    /// Completion time; serialized as `timestamp` in the persisted shape.
    #[serde(default, rename = "timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Branch {
    /// A freshly dispatched branch
    pub fn pending(backend_id: impl Into<ModelId>) -> Self {
        Self {
            backend_id: backend_id.into(),
            status: BranchStatus::Pending,
            text: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
            usage: None,
        }
    }

    /// Record the moment the backend call actually began.
    ///
    /// No-op once the branch is terminal.
    pub fn mark_started(&mut self) {
        if !self.is_terminal() {
            self.started_at = Utc::now();
        }
    }

    /// Move to a terminal status. Returns `false` (and changes nothing) if
    /// the branch had already resolved.
    pub fn resolve(&mut self, outcome: Result<Generation, BackendFailure>) -> bool {
        if self.is_terminal() {
            return false;
        }
        match outcome {
            Ok(generation) => {
                self.status = BranchStatus::Succeeded;
                self.text = Some(generation.text);
                self.usage = generation.usage;
            }
            Err(failure) => {
                self.status = BranchStatus::Failed;
                self.error = Some(failure);
            }
        }
        self.completed_at = Some(Utc::now());
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.status == BranchStatus::Succeeded
    }

    /// Wall-clock time between start and completion, in milliseconds
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.started_at).num_milliseconds())
    }
}
