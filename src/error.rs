use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the RAG core. Every fallible gateway/engine
/// operation reports one of these. The refusal and empty-hit answer
/// literals are ordinary chat answers, not errors, and never travel
/// through this type.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("embedding failed at chunk {index}: {reason}")]
    EmbedFailed { index: usize, reason: String },

    #[error("generation failed: {0}")]
    GenFailed(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl ApiError {
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable(reason.into())
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation(reason.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest")
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound")
            }
            ApiError::StoreUnavailable(msg) => {
                tracing::error!("store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "StoreUnavailable")
            }
            ApiError::EmbedFailed { index, reason } => {
                tracing::error!("embedding failed at chunk {}: {}", index, reason);
                (StatusCode::INTERNAL_SERVER_ERROR, "EmbedFailed")
            }
            ApiError::GenFailed(msg) => {
                tracing::error!("generation failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "GenFailed")
            }
            ApiError::InvariantViolation(msg) => {
                tracing::error!("invariant violation: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InvariantViolation")
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
