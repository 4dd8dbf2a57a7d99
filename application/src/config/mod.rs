//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DispatchParams`]: branch stagger, jitter, deadlines and token budget
//! - [`FusionParams`]: the synthesis backend and its limits
//! - [`PersistenceParams`]: retry policy for transcript writes
//! - [`EnsembleConfig`]: container handed to the session controller

pub mod dispatch_params;
pub mod ensemble_config;
pub mod fusion_params;
pub mod persistence_params;

pub use dispatch_params::{DispatchParams, MAX_SELECTION, MIN_SELECTION};
pub use ensemble_config::EnsembleConfig;
pub use fusion_params::FusionParams;
pub use persistence_params::PersistenceParams;
