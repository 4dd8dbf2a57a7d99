//! Ensemble configuration container.
//!
//! [`EnsembleConfig`] groups the static parameter types so the session
//! controller can hand each use case only the slice it needs.

use crate::config::{DispatchParams, FusionParams, PersistenceParams};

#[derive(Debug, Clone, Default)]
pub struct EnsembleConfig {
    pub dispatch: DispatchParams,
    pub fusion: FusionParams,
    pub persistence: PersistenceParams,
}

impl EnsembleConfig {
    pub fn with_dispatch(mut self, dispatch: DispatchParams) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_fusion(mut self, fusion: FusionParams) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceParams) -> Self {
        self.persistence = persistence;
        self
    }
}
