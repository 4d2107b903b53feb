//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// How many requests a key may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::from_secs(30),
        }
    }
}

/// Rate limiter trait - abstraction over shared counter backends.
///
/// Implementations must check and record atomically: two concurrent calls
/// for the same key can never both observe the pre-increment count.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether `key` may make another request under `quota`,
    /// recording it when allowed.
    async fn check(&self, key: &str, quota: Quota) -> Result<RateLimitResult, RateLimitError>;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest counted request leaves the window.
    pub reset_after: Duration,
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend timed out")]
    Timeout,
}
