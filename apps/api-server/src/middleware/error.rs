//! Error handling - maps failures onto the chat widget's `{ "error": ... }` body.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use folio_core::ChatError;
use folio_core::domain::Admission;
use folio_shared::ErrorResponse;
use std::fmt;

use super::rate_limit::rate_limit_headers;

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound,
    /// Carries the methods the resource does accept.
    MethodNotAllowed(&'static str),
    /// Rate limited, by the guard or by the provider.
    TooManyRequests(Admission),
    /// Logged in full, reported to the caller as a generic error.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound => write!(f, "Not found"),
            AppError::MethodNotAllowed(allow) => write!(f, "Method not allowed: use {}", allow),
            AppError::TooManyRequests(admission) => write!(
                f,
                "Too many requests: retry in {}s",
                admission.retry_after_secs()
            ),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail.clone()),
            AppError::NotFound => ErrorResponse::not_found(),
            AppError::MethodNotAllowed(allow) => {
                builder.insert_header((header::ALLOW, *allow));
                ErrorResponse::method_not_allowed()
            }
            AppError::TooManyRequests(admission) => {
                for pair in rate_limit_headers(admission) {
                    builder.insert_header(pair);
                }
                builder.insert_header((header::RETRY_AFTER, admission.retry_after_secs()));
                ErrorResponse::too_many_requests()
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        builder.json(error)
    }
}

// Conversion from service errors
impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => AppError::BadRequest(msg),
            ChatError::Throttled(admission) => AppError::TooManyRequests(admission),
            ChatError::Completion(e) => AppError::Internal(format!("Completion failed: {}", e)),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
