//! Language model trait and chat message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat-style prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Sampling parameters applied to every request a client sends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { temperature: Some(0.1), max_tokens: Some(256) }
    }
}

/// A generative language model: messages in, reply text out.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{ChatMessage, Llm};
///
/// let reply = llm.chat(&[ChatMessage::user("Summarize this abstract.")]).await?;
/// ```
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Send the conversation and return the assistant reply text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}
