use async_trait::async_trait;
use ensemble_application::BackendAdapter;
use ensemble_domain::{BackendFailure, DispatchOptions, Generation, ModelRegistry, ProviderKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Backend that forwards each call to the adapter of the model's provider.
///
/// The provider comes from the model's registry descriptor. A model the
/// registry doesn't know, or whose provider has no adapter (typically a
/// missing API key), fails the call without touching the network.
pub struct RoutingBackend {
    registry: Arc<ModelRegistry>,
    adapters: HashMap<ProviderKind, Arc<dyn BackendAdapter>>,
}

impl RoutingBackend {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            adapters: HashMap::new(),
        }
    }

    pub fn with_adapter(mut self, kind: ProviderKind, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    /// Providers that have an adapter
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.adapters.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    fn resolve(&self, model: &str) -> Result<&dyn BackendAdapter, BackendFailure> {
        let descriptor = self.registry.describe(model).ok_or_else(|| {
            BackendFailure::NetworkError(format!("no provider route for unknown model {}", model))
        })?;

        self.adapters
            .get(&descriptor.provider)
            .map(|a| a.as_ref())
            .ok_or_else(|| {
                BackendFailure::Unauthorized(format!(
                    "{} provider is not configured (missing API key?)",
                    descriptor.provider
                ))
            })
    }
}

#[async_trait]
impl BackendAdapter for RoutingBackend {
    async fn generate(
        &self,
        prompt: &str,
        options: &DispatchOptions,
    ) -> Result<Generation, BackendFailure> {
        self.resolve(options.model.as_str())?
            .generate(prompt, options)
            .await
    }
}
