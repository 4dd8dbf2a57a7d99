//! Application layer for prudence-ensemble
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{
    DispatchParams, EnsembleConfig, FusionParams, MAX_SELECTION, MIN_SELECTION, PersistenceParams,
};
pub use ports::{
    backend::BackendAdapter,
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{NoProgress, TurnProgressNotifier},
    transcript_store::{StoreError, TranscriptStore},
};
pub use use_cases::dispatch_turn::{DispatchError, LiveTurn, TurnDispatcher};
pub use use_cases::run_turn::{EnsembleSession, RunTurnError, TurnHandle};
pub use use_cases::synthesize::{FusionSynthesizer, contributions};
