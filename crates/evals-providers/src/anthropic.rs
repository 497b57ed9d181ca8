//! Anthropic Messages API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider_traits::{GenerateRequest, Generation, ModelProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Anthropic connection settings
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Settings from `ANTHROPIC_API_KEY` / `ANTHROPIC_BASE_URL`
    pub fn from_env(timeout: Duration) -> Self {
        Self {
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string()),
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn join_text_blocks(response: MessagesResponse) -> ProviderResult<Generation> {
    let text: String = response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse {
            provider: "anthropic".to_string(),
        });
    }
    Ok(Generation { text })
}

/// Client for `POST /v1/messages`
pub struct AnthropicProvider {
    config: AnthropicConfig,
    http_client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> ProviderResult<Self> {
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
impl ModelProvider for AnthropicProvider {
    fn id(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &GenerateRequest) -> ProviderResult<Generation> {
        let api_key =
            self.config
                .api_key
                .as_deref()
                .ok_or_else(|| ProviderError::MissingApiKey {
                    provider: "anthropic".to_string(),
                    env_var: "ANTHROPIC_API_KEY".to_string(),
                })?;

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: self.config.max_tokens,
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        debug!(provider = "anthropic", model = %request.model, "messages request");

        let response = self
            .http_client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: "anthropic".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&response.text().await?)?;
        join_text_blocks(parsed)
    }
}
