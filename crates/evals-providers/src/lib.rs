//! Evals-Providers: model provider plumbing for Openfort Evals
//!
//! This crate owns every outbound model call the harness makes. The rest of
//! the workspace only sees the [`ModelProvider`] trait and the
//! [`ProviderRegistry`] that resolves a (provider, model) pair.
//!
//! ## Key Components
//!
//! - `ModelProvider`: async capability trait implemented per vendor
//! - `OpenAiProvider`: OpenAI-compatible chat completions (OpenAI, Vercel v0)
//! - `AnthropicProvider`: Anthropic Messages API
//! - `fakes`: deterministic in-memory providers for tests

pub mod anthropic;
mod error;
pub mod fakes;
pub mod openai;
pub mod provider_traits;
mod registry;

use std::sync::Arc;
use std::time::Duration;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use error::{ProviderError, ProviderResult};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider_traits::{GenerateRequest, Generation, ModelProvider};
pub use registry::{LanguageModel, ProviderRegistry};

/// Build a registry with the OpenAI, Anthropic and Vercel clients configured
/// from environment variables.
///
/// Missing API keys do not fail here; each call reports
/// [`ProviderError::MissingApiKey`] instead so only the affected tasks fail.
pub fn registry_from_env(timeout: Duration) -> ProviderResult<ProviderRegistry> {
    let openai = OpenAiProvider::new(OpenAiConfig::openai_from_env(timeout))?;
    let vercel = OpenAiProvider::new(OpenAiConfig::vercel_from_env(timeout))?;
    let anthropic = AnthropicProvider::new(AnthropicConfig::from_env(timeout))?;

    Ok(ProviderRegistry::new()
        .with_provider(Arc::new(openai))
        .with_provider(Arc::new(vercel))
        .with_provider(Arc::new(anthropic)))
}
