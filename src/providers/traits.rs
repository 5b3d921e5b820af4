//! Provider trait and message types for completion backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry in an ordered completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A completion backend: ordered messages in, one text completion out.
/// Opaque request/response, no streaming.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat_with_history(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> anyhow::Result<String>;

    /// The name of this provider implementation.
    fn name(&self) -> &str;
}
