//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::ports::{CompletionError, CompletionProvider, RateLimiter};
use folio_core::services::{AdmissionConfig, ChatSettings};
use folio_core::{AdmissionGuard, ChatService};
use folio_infra::{InMemoryRateLimiter, OpenRouterClient};

#[cfg(feature = "redis")]
use folio_infra::RedisRateLimiter;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<AdmissionGuard>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, CompletionError> {
        let limiter = Self::build_limiter(config).await;

        if config.openrouter.api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set. Chat requests will fail.");
        }
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(OpenRouterClient::new(config.openrouter.clone())?);

        tracing::info!(
            rate_limiter = limiter.backend(),
            limit = config.admission.quota.limit,
            window_secs = config.admission.quota.window.as_secs(),
            failure_policy = ?config.admission.failure_policy,
            trusted_proxy_hops = config.admission.trusted_proxy_hops,
            model = %config.openrouter.model,
            "Application state initialized"
        );

        Ok(Self::from_parts(
            limiter,
            provider,
            config.admission,
            config.chat.clone(),
        ))
    }

    /// Assemble the state from already-built ports.
    pub fn from_parts(
        limiter: Arc<dyn RateLimiter>,
        provider: Arc<dyn CompletionProvider>,
        admission: AdmissionConfig,
        chat: ChatSettings,
    ) -> Self {
        Self {
            guard: Arc::new(AdmissionGuard::new(limiter, admission)),
            chat: Arc::new(ChatService::new(provider, chat, admission.quota)),
        }
    }

    #[cfg(feature = "redis")]
    async fn build_limiter(config: &AppConfig) -> Arc<dyn RateLimiter> {
        let Some(redis) = &config.redis else {
            tracing::warn!("KV_URL not set. Rate limits are per-process (in-memory mode).");
            return Arc::new(InMemoryRateLimiter::new());
        };

        match RedisRateLimiter::new(redis.clone()).await {
            Ok(limiter) => Arc::new(limiter),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to Redis: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryRateLimiter::new())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn build_limiter(_config: &AppConfig) -> Arc<dyn RateLimiter> {
        tracing::info!("Running without redis feature - using in-memory rate limiter");
        Arc::new(InMemoryRateLimiter::new())
    }
}
