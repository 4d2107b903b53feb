//! Services - the gateway's use cases, written against the ports.

mod admission;
mod chat;

pub use admission::{AdmissionConfig, AdmissionGuard};
pub use chat::{ChatService, ChatSettings, DEFAULT_CONTEXT};
