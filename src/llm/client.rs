//! HTTP client for the generation and answer models
//!
//! Supports two API formats:
//! - **Anthropic** (default): Claude Messages API with `x-api-key` auth
//! - **OpenAI-compatible**: OpenAI, Ollama, vLLM, LiteLLM, Together, Groq, etc.
//!
//! Set `CYPHERSYNTH_LLM_PROVIDER=openai` to switch to OpenAI-compatible mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LanguageModel, LlmError, Role};

/// Supported API providers
#[derive(Debug, Clone, PartialEq)]
pub enum LlmProvider {
    Anthropic,
    OpenAI,
}

impl LlmProvider {
    fn name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAI => "OpenAI",
        }
    }
}

/// LLM configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub provider: LlmProvider,
}

impl LlmConfig {
    /// Load config from environment.
    ///
    /// Checks `CYPHERSYNTH_LLM_PROVIDER` to determine the provider:
    /// - `"openai"` → OpenAI-compatible mode (checks `OPENAI_API_KEY` then `ANTHROPIC_API_KEY`)
    /// - `"anthropic"` or unset → Anthropic mode (checks `ANTHROPIC_API_KEY`)
    ///
    /// `CYPHERSYNTH_LLM_MODEL` and `CYPHERSYNTH_LLM_API_URL` override the defaults.
    pub fn from_env() -> Result<Self, LlmError> {
        let provider_str = std::env::var("CYPHERSYNTH_LLM_PROVIDER")
            .unwrap_or_default()
            .to_lowercase();

        let (provider, api_key, default_model, default_url) = match provider_str.as_str() {
            "openai" => {
                let key = std::env::var("OPENAI_API_KEY")
                    .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
                    .map_err(|_| LlmError::MissingApiKey("OPENAI_API_KEY"))?;
                (
                    LlmProvider::OpenAI,
                    key,
                    "gpt-4o",
                    "https://api.openai.com/v1/chat/completions",
                )
            }
            _ => {
                let key = std::env::var("ANTHROPIC_API_KEY")
                    .map_err(|_| LlmError::MissingApiKey("ANTHROPIC_API_KEY"))?;
                (
                    LlmProvider::Anthropic,
                    key,
                    "claude-sonnet-4-20250514",
                    "https://api.anthropic.com/v1/messages",
                )
            }
        };

        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey(match provider {
                LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
                LlmProvider::OpenAI => "OPENAI_API_KEY",
            }));
        }

        Ok(Self {
            api_key,
            model: std::env::var("CYPHERSYNTH_LLM_MODEL").unwrap_or_else(|_| default_model.to_string()),
            api_url: std::env::var("CYPHERSYNTH_LLM_API_URL").unwrap_or_else(|_| default_url.to_string()),
            provider,
        })
    }

    /// Same endpoint and credentials, different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// ── Anthropic API types ──

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    text: Option<String>,
}

// ── OpenAI-compatible API types ──

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

/// [`LanguageModel`] backed by a provider HTTP API
#[derive(Debug, Clone)]
pub struct HttpLanguageModel {
    client: Client,
    config: LlmConfig,
}

impl HttpLanguageModel {
    pub fn new(client: Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    async fn call_anthropic(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let provider = self.config.provider.name();
        let (system, conversation) = split_system(messages);
        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens,
            system,
            messages: conversation,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|source| LlmError::Request { provider, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider,
                status,
                body,
            });
        }

        let msg: AnthropicResponse = response
            .json()
            .await
            .map_err(|source| LlmError::Decode { provider, source })?;

        let text = msg
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(LlmError::EmptyResponse { provider });
        }

        Ok(text)
    }

    async fn call_openai(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let provider = self.config.provider.name();
        let request = OpenAIRequest {
            model: &self.config.model,
            max_tokens,
            messages,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|source| LlmError::Request { provider, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider,
                status,
                body,
            });
        }

        let msg: OpenAIResponse = response
            .json()
            .await
            .map_err(|source| LlmError::Decode { provider, source })?;

        let text = msg
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(LlmError::EmptyResponse { provider });
        }

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    fn model_id(&self) -> String {
        self.config.model.clone()
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        match self.config.provider {
            LlmProvider::Anthropic => self.call_anthropic(messages, max_tokens).await,
            LlmProvider::OpenAI => self.call_openai(messages, max_tokens).await,
        }
    }
}

/// Anthropic takes the system prompt as a top-level field, not as a message.
fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>();
    let conversation = messages.iter().filter(|m| m.role != Role::System).collect();

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };
    (system, conversation)
}
