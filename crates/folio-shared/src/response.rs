//! Standardized error body returned by the gateway.

use serde::{Deserialize, Serialize};

/// Error body the chat widget understands: `{ "error": "..." }`.
///
/// Messages are fixed per error class so nothing internal leaks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A human-readable message, safe to show to visitors.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    // Common error constructors
    pub fn too_many_requests() -> Self {
        Self::new("Too many requests. Please wait a moment.")
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(detail)
    }

    pub fn not_found() -> Self {
        Self::new("Not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new("Method not allowed")
    }

    pub fn internal_error() -> Self {
        Self::new("Error")
    }
}
