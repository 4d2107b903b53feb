//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Successful chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    /// Backend enforcing the chat rate limit (`memory` or `redis`).
    pub rate_limiter: String,
}
