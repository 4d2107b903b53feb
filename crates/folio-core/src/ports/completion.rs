//! Text completion port.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::Prompt;

/// Completion provider trait - abstraction over hosted text-generation APIs.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate text for the prompt. The reply is returned unchanged.
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError>;
}

/// Completion errors.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The provider is throttling us.
    #[error("Provider rate limit reached")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider misconfigured: {0}")]
    Configuration(String),
}
