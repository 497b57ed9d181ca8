//! Provider lookup keyed by provider identity.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ProviderResult;
use crate::provider_traits::{GenerateRequest, Generation, ModelProvider};

/// A provider bound to one model identifier.
#[derive(Clone)]
pub struct LanguageModel {
    provider: Arc<dyn ModelProvider>,
    model: String,
}

impl LanguageModel {
    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion for `prompt` under the given system instruction.
    pub async fn generate(&self, system: Option<&str>, prompt: &str) -> ProviderResult<Generation> {
        let mut request = GenerateRequest::new(self.model.clone(), prompt);
        if let Some(system) = system {
            request = request.with_system(system);
        }
        self.provider.generate(&request).await
    }
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModel")
            .field("provider", &self.provider.id())
            .field("model", &self.model)
            .finish()
    }
}

/// Registered providers, resolved by identity.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own identity, replacing any previous entry.
    pub fn register(&mut self, provider: Arc<dyn ModelProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Resolve a (provider, model) pair. Returns `None` when the provider is
    /// not registered or does not serve the model.
    pub fn resolve(&self, provider: &str, model: &str) -> Option<LanguageModel> {
        let p = self.providers.get(provider)?;
        if !p.supports(model) {
            return None;
        }
        Some(LanguageModel {
            provider: Arc::clone(p),
            model: model.to_string(),
        })
    }

    /// Registered provider identities, sorted.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}
