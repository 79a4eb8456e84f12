//! Mapping of failures onto HTTP status codes and error codes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::response::ApiResponse;
use crate::domain::errors::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity, .. } => Self::new(
                StatusCode::NOT_FOUND,
                format!("{}_NOT_FOUND", entity.to_uppercase()),
                err.to_string(),
            ),
            DomainError::ValidationFailed(message) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            }
            DomainError::InsufficientStock { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK", err.to_string())
            }
            DomainError::Conflict(message) => Self::new(StatusCode::CONFLICT, "CONFLICT", message),
            DomainError::Unauthorized(message) => Self::unauthorized(message),
            DomainError::DatabaseError(_) | DomainError::SerializationError(_) => {
                tracing::error!(error = %err, "request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_BODY", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_QUERY", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(self.status, self.code, self.message).into_response()
    }
}

/// Parse a path id, answering 400 `INVALID_ID` when it is not an integer.
pub fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ID", format!("invalid id: {raw}")))
}
