//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory rate limiting only
//! - `redis` - Redis-backed rate limiting shared across instances

pub mod completion;
pub mod rate_limit;

// Re-exports
pub use completion::{OpenRouterClient, OpenRouterConfig};
pub use rate_limit::InMemoryRateLimiter;

#[cfg(feature = "redis")]
pub use rate_limit::{RedisConfig, RedisRateLimiter};
