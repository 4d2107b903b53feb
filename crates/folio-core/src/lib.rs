//! # Folio Core
//!
//! The domain layer of the Folio chat gateway.
//! This crate holds the admission and chat logic with zero infrastructure
//! dependencies; storage and the upstream model are reached through `ports`.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::ChatError;
pub use services::{AdmissionGuard, ChatService};
