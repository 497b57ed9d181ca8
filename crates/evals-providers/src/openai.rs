//! OpenAI-compatible chat completions client.
//!
//! Serves both OpenAI itself and Vercel's v0 Model API, which speaks the
//! same `/chat/completions` protocol under a different base URL and key.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider_traits::{GenerateRequest, Generation, ModelProvider};

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Provider identity this endpoint is registered under.
    pub provider_id: String,
    /// Base URL without trailing slash (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    /// Bearer token. Absence is reported per call, not at construction.
    pub api_key: Option<String>,
    /// Environment variable the key is read from (for error messages).
    pub api_key_env: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// OpenAI settings from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn openai_from_env(timeout: Duration) -> Self {
        Self {
            provider_id: "openai".to_string(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout,
        }
    }

    /// Vercel v0 settings from `V0_API_KEY` / `V0_BASE_URL`.
    pub fn vercel_from_env(timeout: Duration) -> Self {
        Self {
            provider_id: "vercel".to_string(),
            base_url: std::env::var("V0_BASE_URL")
                .unwrap_or_else(|_| "https://api.v0.dev/v1".to_string()),
            api_key: std::env::var("V0_API_KEY").ok(),
            api_key_env: "V0_API_KEY".to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_chat_request(request: &GenerateRequest) -> ChatRequest<'_> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system.as_deref() {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });
    ChatRequest {
        model: &request.model,
        messages,
    }
}

fn extract_text(provider: &str, response: ChatResponse) -> ProviderResult<Generation> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse {
            provider: provider.to_string(),
        });
    }
    Ok(Generation { text })
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("openfort-evals/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    async fn generate(&self, request: &GenerateRequest) -> ProviderResult<Generation> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingApiKey {
                provider: self.config.provider_id.clone(),
                env_var: self.config.api_key_env.clone(),
            })?;

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(provider = %self.config.provider_id, model = %request.model, "chat completion request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&build_chat_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: self.config.provider_id.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        extract_text(&self.config.provider_id, parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_includes_system_first() {
        let req = GenerateRequest::new("gpt-4o", "write code").with_system("fenced blocks");
        let body = serde_json::to_value(build_chat_request(&req)).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "fenced blocks");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "write code");
    }

    #[test]
    fn test_chat_request_without_system() {
        let req = GenerateRequest::new("v0-1.5-md", "hi");
        let body = serde_json::to_value(build_chat_request(&req)).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text("openai", parsed).unwrap().text, "hello");
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_text("openai", parsed),
            Err(ProviderError::EmptyResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let provider = OpenAiProvider::new(OpenAiConfig {
            provider_id: "openai".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let err = provider
            .generate(&GenerateRequest::new("gpt-4o", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
    }
}
