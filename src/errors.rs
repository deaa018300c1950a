use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy shared by every service operation.
///
/// Nothing here escapes a public handler as a panic or an uncaught error: list
/// reads degrade to empty envelopes, writes surface an explicit error message.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}

/// Body returned when a handler propagates a `ServiceError` directly instead of
/// folding it into a result envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, label) = match &self {
            ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ServiceError::ValidationError(_) | ServiceError::InvalidStatus(_) => {
                (StatusCode::BAD_REQUEST, "Bad Request")
            }
        };

        let message = match &self {
            // Do not leak driver-level details to clients.
            ServiceError::DatabaseError(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: label.to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
