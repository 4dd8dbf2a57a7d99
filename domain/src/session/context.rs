//! Session context: explicit per-session configuration
//!
//! Holds the backend selection and the per-backend temperature map. Only the
//! session controller mutates it, between turns; the dispatcher works from a
//! [`DispatchSnapshot`] taken at dispatch start so a running branch never
//! observes a changed value.

use crate::core::error::DomainError;
use crate::core::model::ModelId;
use crate::core::registry::ModelRegistry;
use crate::transcript::session_key::SessionKey;
use crate::turn::value_objects::DEFAULT_TEMPERATURE;
use std::collections::HashMap;

/// Mutable configuration of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    key: SessionKey,
    selection: Vec<ModelId>,
    temperatures: HashMap<ModelId, f32>,
}

impl SessionContext {
    /// New session using the registry's default selection
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            selection: ModelRegistry::default_selection(),
            temperatures: HashMap::new(),
        }
    }

    pub fn with_selection(mut self, selection: Vec<ModelId>) -> Self {
        self.selection = selection;
        self
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn selection(&self) -> &[ModelId] {
        &self.selection
    }

    /// Replace the backend selection. Size and membership are checked at
    /// dispatch time.
    pub fn set_selection(&mut self, selection: Vec<ModelId>) {
        self.selection = selection;
    }

    /// Set one backend's temperature; values outside `[0, 1]` are rejected
    pub fn set_temperature(
        &mut self,
        model: impl Into<ModelId>,
        value: f32,
    ) -> Result<(), DomainError> {
        let model = model.into();
        if !(0.0..=1.0).contains(&value) {
            return Err(DomainError::InvalidTemperature {
                model: model.to_string(),
                value,
            });
        }
        self.temperatures.insert(model, value);
        Ok(())
    }

    /// Temperature for a backend, or the default when unset
    pub fn temperature_for(&self, model: &ModelId) -> f32 {
        self.temperatures
            .get(model)
            .copied()
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Freeze selection and temperatures for one dispatch
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            selection: self.selection.clone(),
            temperatures: self
                .selection
                .iter()
                .map(|id| (id.clone(), self.temperature_for(id)))
                .collect(),
        }
    }
}

/// Immutable copy of the dispatch-relevant parts of a [`SessionContext`]
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSnapshot {
    pub selection: Vec<ModelId>,
    pub temperatures: HashMap<ModelId, f32>,
}

impl DispatchSnapshot {
    pub fn new(selection: Vec<ModelId>, temperatures: HashMap<ModelId, f32>) -> Self {
        Self {
            selection,
            temperatures,
        }
    }

    pub fn temperature_for(&self, model: &ModelId) -> f32 {
        self.temperatures
            .get(model)
            .copied()
            .unwrap_or(DEFAULT_TEMPERATURE)
    }
}
