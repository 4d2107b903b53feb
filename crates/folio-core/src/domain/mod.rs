//! Domain types - the values the gateway reasons about.

mod admission;
mod chat;
mod identity;

pub use admission::{Admission, FailurePolicy};
pub use chat::{ChatExchange, Prompt};
pub use identity::{ClientIdentity, DEFAULT_CLIENT_ADDRESS};
