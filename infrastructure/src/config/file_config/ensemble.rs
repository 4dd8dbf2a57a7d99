//! Ensemble configuration from TOML (`[ensemble]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [ensemble]
//! selection = ["llama4-maverick-17b-128e-instruct", "gemini-2.0-flash"]
//! synthesis_model = "gemini-2.5-flash"
//!
//! [ensemble.temperatures]
//! "gemini-2.0-flash" = 0.3
//! ```

use ensemble_domain::ModelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEnsembleConfig {
    /// Backends that answer each turn (2 to 3); built-in default when unset
    pub selection: Option<Vec<String>>,
    /// Backend that merges the answers
    pub synthesis_model: Option<String>,
    /// Per-backend temperature overrides
    pub temperatures: BTreeMap<String, f32>,
}

impl FileEnsembleConfig {
    pub fn parse_selection(&self) -> Option<Vec<ModelId>> {
        self.selection
            .as_ref()
            .map(|ids| ids.iter().map(|s| ModelId::from(s.trim())).collect())
    }
}
