//! Redis rate limiter implementation using a sliding window log.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo, Script};

use folio_core::ports::{Quota, RateLimitError, RateLimitResult, RateLimiter};

/// Atomic check-and-record over a sorted set of request timestamps.
///
/// Uses the server clock so every instance sees the same window.
/// Returns: [allowed, count, reset_ms]
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])
local member = ARGV[3]

local time = redis.call('TIME')
local now_ms = tonumber(time[1]) * 1000 + math.floor(tonumber(time[2]) / 1000)

redis.call('ZREMRANGEBYSCORE', key, '-inf', now_ms - window_ms)

local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
    redis.call('ZADD', key, now_ms, now_ms .. ':' .. member)
    count = count + 1
    allowed = 1
end

if count > 0 then
    redis.call('PEXPIRE', key, window_ms)
end

local reset_ms = window_ms
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] then
    reset_ms = tonumber(oldest[2]) + window_ms - now_ms
end

return {allowed, count, reset_ms}
"#;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., rediss://default@host:6379)
    pub url: String,
    /// Password applied on top of the URL, for hosted stores that hand out tokens
    pub token: Option<String>,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Per-check timeout
    pub command_timeout: Duration,
    /// Key prefix for rate limit keys
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_millis(1000),
            key_prefix: "folio:chat".to_string(),
        }
    }
}

/// Redis-backed rate limiter shared by every gateway instance.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RedisConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(config: RedisConfig) -> Result<Self, RateLimitError> {
        let mut info = config
            .url
            .as_str()
            .into_connection_info()
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;
        if let Some(token) = &config.token {
            info.redis.password = Some(token.clone());
        }

        let client = Client::open(info).map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RateLimitError::Timeout)?
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        tracing::info!(prefix = %config.key_prefix, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        })
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str, quota: Quota) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn.clone();
        let window_ms = u64::try_from(quota.window.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut invocation = self.script.key(&redis_key);
        invocation
            .arg(quota.limit)
            .arg(window_ms)
            .arg(uuid::Uuid::new_v4().to_string());

        let result: Vec<i64> = tokio::time::timeout(
            self.config.command_timeout,
            invocation.invoke_async(&mut conn),
        )
        .await
        .map_err(|_| RateLimitError::Timeout)?
        .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let [allowed, count, reset_ms] = result[..] else {
            return Err(RateLimitError::Backend(format!(
                "unexpected script reply: {result:?}"
            )));
        };

        let used = u32::try_from(count.max(0)).unwrap_or(u32::MAX);

        Ok(RateLimitResult {
            allowed: allowed == 1,
            limit: quota.limit,
            remaining: quota.limit.saturating_sub(used),
            reset_after: Duration::from_millis(reset_ms.max(0) as u64),
        })
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
