//! Service-level error types.

use thiserror::Error;

use crate::domain::Admission;
use crate::ports::CompletionError;

/// Chat errors - everything a chat request can fail with after admission.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Rejected for rate limiting, locally or by the provider.
    #[error("Too many requests, retry in {}s", .0.retry_after_secs())]
    Throttled(Admission),

    #[error("Completion failed: {0}")]
    Completion(CompletionError),
}
