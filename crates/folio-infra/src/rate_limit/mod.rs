//! Rate limiting implementations.
//!
//! Both backends enforce the same sliding window log: at most `limit`
//! admitted requests in any trailing `window`, denied requests not counted.

mod memory;

pub use memory::InMemoryRateLimiter;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisRateLimiter};
