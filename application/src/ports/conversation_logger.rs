//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording turn events
//! (turn started, branch completed, fusion completed, turn persisted) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the exchange itself
//! in a machine-readable format (JSONL).

use ensemble_domain::{Branch, FusionOutcome, Turn, TurnId};
use serde_json::{Value, json};

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "turn_started", "branch_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn turn_started(turn: &Turn) -> Self {
        Self::new(
            "turn_started",
            json!({
                "turn_id": turn.turn_id.to_string(),
                "message": turn.user_message.content(),
                "backends": turn.backend_ids().iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            }),
        )
    }

    pub fn branch_completed(turn_id: &TurnId, index: usize, branch: &Branch) -> Self {
        Self::new(
            "branch_completed",
            json!({
                "turn_id": turn_id.to_string(),
                "index": index,
                "backend": branch.backend_id.as_str(),
                "status": branch.status.as_str(),
                "bytes": branch.text.as_ref().map(|t| t.len()),
                "error": branch.error.as_ref().map(|e| e.to_string()),
                "elapsed_ms": branch.elapsed_ms(),
            }),
        )
    }

    pub fn fusion_completed(turn_id: &TurnId, outcome: &FusionOutcome) -> Self {
        Self::new(
            "fusion_completed",
            json!({
                "turn_id": turn_id.to_string(),
                "status": outcome.status.as_str(),
                "bytes": outcome.fused_answer.as_ref().map(|t| t.len()),
                "error": outcome.error.as_ref().map(|e| e.to_string()),
            }),
        )
    }

    pub fn turn_persisted(turn: &Turn, attempts: u32) -> Self {
        Self::new(
            "turn_persisted",
            json!({
                "turn_id": turn.turn_id.to_string(),
                "attempts": attempts,
            }),
        )
    }
}

/// Port for logging conversation events to a structured log.
///
/// The `log` method is synchronous and non-fallible so that logging never
/// disrupts a turn; logging failures are ignored.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_domain::{BackendFailure, Generation, ModelId, UserMessage};

    #[test]
    fn test_branch_completed_payload() {
        let turn_id = TurnId::generate();
        let mut branch = Branch::pending(ModelId::from("qwen-3-32b"));
        branch.resolve(Err(BackendFailure::RateLimited("429".to_string())));

        let event = ConversationEvent::branch_completed(&turn_id, 1, &branch);
        assert_eq!(event.event_type, "branch_completed");
        assert_eq!(event.payload["backend"], "qwen-3-32b");
        assert_eq!(event.payload["status"], "failed");
        assert_eq!(event.payload["index"], 1);
        assert!(event.payload["bytes"].is_null());
    }

    #[test]
    fn test_turn_started_lists_backends_in_order() {
        let selection = vec![ModelId::from("b"), ModelId::from("a")];
        let mut turn = Turn::new(
            TurnId::generate(),
            UserMessage::new("hello").unwrap(),
            &selection,
        );
        turn.branches[0].resolve(Ok(Generation::new("x")));

        let event = ConversationEvent::turn_started(&turn);
        assert_eq!(event.payload["backends"], json!(["b", "a"]));
        assert_eq!(event.payload["message"], "hello");
    }
}
