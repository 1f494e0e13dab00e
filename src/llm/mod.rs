//! Language model access
//!
//! The pipeline only needs "messages in, text out". [`LanguageModel`] is that seam;
//! [`client::HttpLanguageModel`] implements it over the Anthropic Messages API and
//! OpenAI-compatible chat completions.

pub mod client;
pub mod errors;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::{HttpLanguageModel, LlmConfig, LlmProvider};
pub use errors::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A role-tagged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier recorded as the `model` of every generated record
    fn model_id(&self) -> String;

    /// Send `messages` and return the response text, generating at most `max_tokens`.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32)
        -> Result<String, LlmError>;
}
