//! Provider capability trait and request/response types.
//!
//! Every upstream vendor is reached through [`ModelProvider`]. The harness
//! never talks to an HTTP client directly, which lets tests swap in the
//! in-memory providers from [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Provider-specific model identifier (e.g. `gpt-4o`).
    pub model: String,
    /// System instruction sent ahead of the prompt.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
        }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Text produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
}

/// An upstream model vendor.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Stable provider identity (`openai`, `anthropic`, ...). Rate limiting
    /// is keyed on this value.
    fn id(&self) -> &str;

    /// Whether this provider can serve `model`.
    fn supports(&self, model: &str) -> bool {
        !model.trim().is_empty()
    }

    /// Run one generation call.
    async fn generate(&self, request: &GenerateRequest) -> ProviderResult<Generation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = GenerateRequest::new("gpt-4o", "hello").with_system("be terse");
        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.prompt, "hello");
        assert_eq!(req.system.as_deref(), Some("be terse"));
    }
}
