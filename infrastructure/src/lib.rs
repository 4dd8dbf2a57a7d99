//! Infrastructure layer for prudence-ensemble
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP backend adapters, transcript stores,
//! the JSONL conversation logger, and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat,
};
pub use logging::JsonlConversationLogger;
pub use providers::{CerebrasAdapter, GeminiAdapter, ProviderError, RoutingBackend};
pub use store::{InMemoryTranscriptStore, JsonFileTranscriptStore, PolicyRoutedStore};
