//! In-memory sliding window rate limiter.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use folio_core::ports::{Quota, RateLimitError, RateLimitResult, RateLimiter};

/// Idle keys are swept once every this many checks.
const SWEEP_INTERVAL: u64 = 1024;

/// In-memory rate limiter keeping a timestamp log per key.
///
/// This is the fallback when Redis is not available.
/// Note: Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    checks: AtomicU64,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn prune(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = log.front() {
        if now.duration_since(oldest) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str, quota: Quota) -> Result<RateLimitResult, RateLimitError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            windows.retain(|_, log| {
                prune(log, now, quota.window);
                !log.is_empty()
            });
        }

        let log = windows.entry(key.to_string()).or_default();
        prune(log, now, quota.window);

        let allowed = (log.len() as u64) < u64::from(quota.limit);
        if allowed {
            log.push_back(now);
        }

        let used = u32::try_from(log.len()).unwrap_or(u32::MAX);
        let reset_after = log
            .front()
            .map(|&oldest| quota.window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(quota.window);

        Ok(RateLimitResult {
            allowed,
            limit: quota.limit,
            remaining: quota.limit.saturating_sub(used),
            reset_after,
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
