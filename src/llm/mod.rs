//! Text-generation client abstraction.
//!
//! The core only sees [`TextGeneration`]: role-tagged messages in, one text
//! completion out. [`openai::OpenAiClient`] is the HTTP implementation; tests
//! use a scripted implementation from `test_support`.

pub mod json;
pub mod openai;

use crate::model::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use openai::OpenAiClient;

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Failures of the text-generation endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Rejected credentials can only be fixed by changing configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Unauthorized(_))
    }

    /// Failures worth another attempt under the retry bound.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Unreachable(_)
                | LlmError::RateLimited(_)
                | LlmError::Timeout(_)
                | LlmError::InvalidResponse(_)
        )
    }
}

/// A stateless chat-completion endpoint.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Model identifier reported in agent records and audit headers.
    fn model(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Run one completion under a deadline. An expired deadline is `LlmError::Timeout`.
pub async fn complete_with_timeout(
    client: &dyn TextGeneration,
    messages: &[ChatMessage],
    timeout: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, client.complete(messages)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(timeout)),
    }
}
