//! OpenRouter completion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use folio_core::domain::Prompt;
use folio_core::ports::{CompletionError, CompletionProvider};

/// Longest upstream error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// OpenRouter client configuration.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Bearer credential. Requests fail with a configuration error without it.
    pub api_key: Option<String>,
    /// API base, without the trailing `/chat/completions`
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: u32,
    /// Sent as `HTTP-Referer` for OpenRouter attribution
    pub site_url: Option<String>,
    /// Sent as `X-Title` for OpenRouter attribution
    pub site_title: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "tngtech/deepseek-r1t2-chimera:free".to_string(),
            max_output_tokens: 100,
            site_url: None,
            site_title: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    per_request_limits: RequestLimits,
}

#[derive(Serialize)]
struct RequestLimits {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct Choice {
    text: Option<String>,
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl Choice {
    /// Prompt-style choices carry `text`, chat-style ones `message.content`.
    fn into_text(self) -> Option<String> {
        self.text
            .or_else(|| self.message.and_then(|message| message.content))
    }
}

#[derive(Deserialize)]
struct ProviderError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

/// Text completion over OpenRouter's `/chat/completions` endpoint, sending a
/// single raw prompt.
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

/// Parse a delay-seconds `Retry-After`. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::Configuration("API key is not set".to_string()))?;

        let body = CompletionRequest {
            model: &self.config.model,
            prompt: prompt.as_str(),
            per_request_limits: RequestLimits {
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let mut request = self.client.post(self.endpoint()).bearer_auth(api_key).json(&body);
        if let Some(site_url) = &self.config.site_url {
            request = request.header("HTTP-Referer", site_url);
        }
        if let Some(site_title) = &self.config.site_title {
            request = request.header("X-Title", site_title);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Transport("request timed out".to_string())
            } else {
                CompletionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                message: truncate(message),
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        // OpenRouter can report failures inside a 200 body.
        if let Some(error) = body.error {
            return Err(match error.code {
                Some(429) => CompletionError::RateLimited { retry_after: None },
                code => CompletionError::Upstream {
                    status: code.unwrap_or(status.as_u16()),
                    message: truncate(error.message),
                },
            });
        }

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(Choice::into_text)
            .ok_or_else(|| CompletionError::MalformedResponse("no choices in response".to_string()))?;

        tracing::debug!(model = %self.config.model, chars = text.len(), "Completion received");

        Ok(text)
    }
}
