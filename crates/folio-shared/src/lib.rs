//! # Folio Shared
//!
//! Wire types shared between the gateway and the site's chat widget.

pub mod dto;
pub mod headers;
pub mod response;

pub use response::ErrorResponse;
