//! Turn entity: one full exchange with the ensemble

use crate::core::message::UserMessage;
use crate::core::model::ModelId;
use crate::core::string::truncate_chars;
use crate::turn::branch::Branch;
use crate::turn::failure::BackendFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Characters of the user message kept in a turn title.
const TITLE_CHARS: usize = 30;

/// Unique, time-ordered turn identifier (UUIDv7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    /// Generate a new id; ids generated later sort after earlier ones.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TurnId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// How the fused answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FusionStatus {
    /// Branches still in flight or fusion not yet run. Never persisted.
    Pending,
    /// The synthesis backend produced the fused answer
    Synthesized,
    /// Synthesis failed; the fused answer is the joined branch texts
    FallbackConcatenated,
    /// No branch succeeded, so fusion was not attempted
    Unavailable,
}

impl FusionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FusionStatus::Pending)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            FusionStatus::FallbackConcatenated | FusionStatus::Unavailable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FusionStatus::Pending => "pending",
            FusionStatus::Synthesized => "synthesized",
            FusionStatus::FallbackConcatenated => "fallback-concatenated",
            FusionStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for FusionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the fusion step
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    pub fused_answer: Option<String>,
    pub status: FusionStatus,
    /// Why synthesis degraded, when it did
    pub error: Option<BackendFailure>,
}

impl FusionOutcome {
    pub fn synthesized(text: impl Into<String>) -> Self {
        Self {
            fused_answer: Some(text.into()),
            status: FusionStatus::Synthesized,
            error: None,
        }
    }

    pub fn fallback(text: impl Into<String>, error: BackendFailure) -> Self {
        Self {
            fused_answer: Some(text.into()),
            status: FusionStatus::FallbackConcatenated,
            error: Some(error),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fused_answer: None,
            status: FusionStatus::Unavailable,
            error: None,
        }
    }
}

/// One user exchange: the message, every branch outcome and the fused answer
///
/// Branch slots are allocated at construction, in selection order, so that
/// out-of-order completion only ever updates a slot in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub turn_id: TurnId,
    pub user_message: UserMessage,
    pub timestamp: DateTime<Utc>,
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub fused_answer: Option<String>,
    pub fusion_status: FusionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion_error: Option<BackendFailure>,
}

impl Turn {
    /// A live turn with one pending branch per selected backend
    pub fn new(turn_id: TurnId, user_message: UserMessage, selection: &[ModelId]) -> Self {
        Self {
            turn_id,
            user_message,
            timestamp: Utc::now(),
            branches: selection.iter().cloned().map(Branch::pending).collect(),
            fused_answer: None,
            fusion_status: FusionStatus::Pending,
            fusion_error: None,
        }
    }

    /// Backend ids in selection order
    pub fn backend_ids(&self) -> Vec<&ModelId> {
        self.branches.iter().map(|b| &b.backend_id).collect()
    }

    /// Every branch has reached a terminal status
    pub fn is_settled(&self) -> bool {
        self.branches.iter().all(Branch::is_terminal)
    }

    /// All branches and fusion are terminal; only such turns may be persisted
    pub fn is_terminal(&self) -> bool {
        self.is_settled() && self.fusion_status.is_terminal()
    }

    /// Succeeded branches in selection order
    pub fn succeeded_branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter().filter(|b| b.is_success())
    }

    /// Failed branches in selection order
    pub fn failed_branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches
            .iter()
            .filter(|b| b.status == crate::turn::branch::BranchStatus::Failed)
    }

    /// Record the fusion result
    pub fn apply_fusion(&mut self, outcome: FusionOutcome) {
        self.fused_answer = outcome.fused_answer;
        self.fusion_status = outcome.status;
        self.fusion_error = outcome.error;
    }

    /// Short title for history listings
    pub fn title(&self) -> String {
        truncate_chars(self.user_message.content(), TITLE_CHARS)
    }
}
