use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Outcome of an admission check, with the metadata reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Configured requests per window.
    pub limit: u32,
    /// Requests still permitted in the current window.
    pub remaining: u32,
    /// Delay until the window frees up a slot.
    pub retry_after: Duration,
    /// Absolute time the window frees up a slot.
    pub reset_at: DateTime<Utc>,
}

impl Admission {
    pub fn new(
        allowed: bool,
        limit: u32,
        remaining: u32,
        retry_after: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let reset_at = chrono::Duration::from_std(retry_after)
            .ok()
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            allowed,
            limit,
            remaining: remaining.min(limit),
            retry_after,
            reset_at,
        }
    }

    /// A permitted request.
    pub fn allow(limit: u32, remaining: u32, retry_after: Duration) -> Self {
        Self::new(true, limit, remaining, retry_after, Utc::now())
    }

    /// A rejected request. Nothing remains until `retry_after` has passed.
    pub fn deny(limit: u32, retry_after: Duration) -> Self {
        Self::new(false, limit, 0, retry_after, Utc::now())
    }

    /// Whole seconds to wait, rounded up and never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        let secs = if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        };
        secs.max(1)
    }

    /// Reset time as unix epoch milliseconds.
    pub fn reset_at_millis(&self) -> i64 {
        self.reset_at.timestamp_millis()
    }
}

/// What to do when the counter store cannot be consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit the request. Availability wins over the limit.
    #[default]
    Open,
    /// Deny the request as if the limit had been reached.
    Closed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "fail-open" => Ok(Self::Open),
            "closed" | "fail-closed" => Ok(Self::Closed),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}
