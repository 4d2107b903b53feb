//! Completion provider implementations.

mod openrouter;

pub use openrouter::{OpenRouterClient, OpenRouterConfig};
