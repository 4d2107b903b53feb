//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use folio_core::domain::FailurePolicy;
use folio_core::ports::Quota;
use folio_core::services::{AdmissionConfig, ChatSettings};
use folio_infra::OpenRouterConfig;

#[cfg(feature = "redis")]
use folio_infra::RedisConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub admission: AdmissionConfig,
    /// Shared counter store. `None` runs the in-memory limiter.
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub openrouter: OpenRouterConfig,
    pub chat: ChatSettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let failure_policy = match lookup("ADMISSION_FAILURE_POLICY") {
            Some(raw) => FailurePolicy::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("{}; defaulting to fail-open", e);
                FailurePolicy::Open
            }),
            None => FailurePolicy::Open,
        };

        let admission = AdmissionConfig {
            quota: Quota::new(
                parse("RATE_LIMIT_MAX_REQUESTS")
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(5),
                Duration::from_secs(parse("RATE_LIMIT_WINDOW_SECS").unwrap_or(30).max(1)),
            ),
            failure_policy,
            trusted_proxy_hops: parse("TRUSTED_PROXY_HOPS")
                .map(|n| n.max(1) as usize)
                .unwrap_or(1),
        };

        #[cfg(feature = "redis")]
        let redis = lookup("KV_URL").map(|url| {
            let defaults = RedisConfig::default();
            RedisConfig {
                url,
                token: lookup("KV_TOKEN").filter(|t| !t.is_empty()),
                connect_timeout: parse("REDIS_CONNECT_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.connect_timeout),
                command_timeout: parse("REDIS_COMMAND_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.command_timeout),
                key_prefix: lookup("RATE_LIMIT_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            }
        });

        let openrouter = {
            let defaults = OpenRouterConfig::default();
            OpenRouterConfig {
                api_key: lookup("OPENROUTER_API_KEY").filter(|k| !k.is_empty()),
                base_url: lookup("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
                model: lookup("OPENROUTER_MODEL").unwrap_or(defaults.model),
                max_output_tokens: parse("OPENROUTER_MAX_OUTPUT_TOKENS")
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(defaults.max_output_tokens),
                site_url: lookup("OPENROUTER_SITE_URL"),
                site_title: lookup("OPENROUTER_SITE_TITLE"),
                timeout: parse("UPSTREAM_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
            }
        };

        let chat = {
            let defaults = ChatSettings::default();
            ChatSettings {
                context: lookup("CHAT_CONTEXT")
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(defaults.context),
                max_message_chars: parse("CHAT_MAX_MESSAGE_CHARS")
                    .map(|n| n as usize)
                    .unwrap_or(defaults.max_message_chars),
            }
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            admission,
            #[cfg(feature = "redis")]
            redis,
            openrouter,
            chat,
        }
    }
}
