//! Chat service - turns an admitted message into a provider reply.

use std::sync::Arc;

use crate::domain::{Admission, ChatExchange, Prompt};
use crate::error::ChatError;
use crate::ports::{CompletionError, CompletionProvider, Quota};

/// Preamble used when no context is configured.
pub const DEFAULT_CONTEXT: &str =
    "Imagine you are me. I'm a software developer. You will answer short questions about my self.";

/// Chat settings.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Static text placed before every visitor question.
    pub context: String,
    /// Longest accepted message, in characters.
    pub max_message_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
            max_message_chars: 2000,
        }
    }
}

/// Wraps the completion provider with prompt construction and error mapping.
pub struct ChatService {
    provider: Arc<dyn CompletionProvider>,
    settings: ChatSettings,
    /// Used to shape provider throttling like a local denial.
    quota: Quota,
}

impl ChatService {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: ChatSettings, quota: Quota) -> Self {
        Self {
            provider,
            settings,
            quota,
        }
    }

    /// Ask the provider about `message`. Not retried on failure.
    pub async fn reply(&self, message: &str) -> Result<ChatExchange, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::Validation(
                "Message must not be empty".to_string(),
            ));
        }
        if message.chars().count() > self.settings.max_message_chars {
            return Err(ChatError::Validation(format!(
                "Message must be at most {} characters",
                self.settings.max_message_chars
            )));
        }

        let prompt = Prompt::build(&self.settings.context, message);

        match self.provider.complete(&prompt).await {
            Ok(reply) => Ok(ChatExchange {
                message: message.to_string(),
                reply,
            }),
            Err(CompletionError::RateLimited { retry_after }) => {
                let retry_after = retry_after.unwrap_or(self.quota.window);
                tracing::warn!(
                    retry_after_secs = retry_after.as_secs(),
                    "Completion provider is rate limiting"
                );
                Err(ChatError::Throttled(Admission::deny(
                    self.quota.limit,
                    retry_after,
                )))
            }
            Err(e) => Err(ChatError::Completion(e)),
        }
    }
}
