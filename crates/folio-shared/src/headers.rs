//! Header names attached to chat responses.
//!
//! Lowercase so they can be used with `HeaderName::from_static`.

/// Requests permitted per window.
pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";

/// Requests left in the current window.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Unix epoch milliseconds at which a slot frees up.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Request correlation ID, echoed from the caller or generated.
pub const REQUEST_ID: &str = "x-request-id";
