//! Language-model client contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One `{role, content}` entry of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Text generation from an ordered message list.
///
/// Errors are propagated to the caller as-is; nodes add no retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion, blocking the calling thread.
    fn generate(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;

    /// Generate a completion, suspending until the model responds.
    async fn generate_async(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}
