//! Error types for evals-providers

use thiserror::Error;

/// Errors that can occur while calling a model provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Credentials for the provider are not configured
    #[error("{provider} API key not set (expected in {env_var})")]
    MissingApiKey { provider: String, env_var: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response decoded but carried no text
    #[error("{provider} returned an empty completion")]
    EmptyResponse { provider: String },

    /// Catch-all used by fakes and custom providers
    #[error("provider failure: {0}")]
    Other(String),
}

/// Result type for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
