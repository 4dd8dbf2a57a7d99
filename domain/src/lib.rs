//! Domain layer for prudence-ensemble
//!
//! This crate contains the core entities and value objects of the ensemble
//! engine. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Branch**: one backend's single attempt within a turn
//! - **Turn**: the user message, every branch outcome and the fused answer
//! - **Fusion**: one coherent answer synthesized from the succeeded branches,
//!   or their concatenation when synthesis fails
//! - **Transcript**: the bounded, most-recent-first history of one session

pub mod config;
pub mod core;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod transcript;
pub mod turn;

// Re-export commonly used types
pub use config::OutputFormat;
pub use core::{
    error::DomainError,
    message::{DEFAULT_MAX_MESSAGE_CHARS, UserMessage},
    model::{ModelDescriptor, ModelFamily, ModelId, ProviderKind},
    registry::{DEFAULT_SYNTHESIS_MODEL, ModelRegistry},
};
pub use prompt::{FALLBACK_SEPARATOR, PromptTemplate};
pub use providers::{CerebrasProviderConfig, GeminiProviderConfig, ProviderConfig};
pub use session::context::{DispatchSnapshot, SessionContext};
pub use transcript::{
    entities::{DEFAULT_TRANSCRIPT_CAPACITY, Transcript, TranscriptError},
    session_key::{SessionKey, StorePolicy},
};
pub use turn::{
    branch::{Branch, BranchStatus},
    entities::{FusionOutcome, FusionStatus, Turn, TurnId},
    failure::BackendFailure,
    value_objects::{
        DEFAULT_BRANCH_MAX_TOKENS, DEFAULT_TEMPERATURE, DispatchOptions, Generation, TokenUsage,
        clamp_temperature,
    },
};
