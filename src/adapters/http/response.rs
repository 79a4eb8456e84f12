//! The JSON envelope every endpoint answers with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::domain::models::{Page, Pagination};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: Option<T>,
    pub date: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn build(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: message.into(),
            pagination: None,
            err: None,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::build(StatusCode::OK, Some(data), message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::build(StatusCode::CREATED, Some(data), message)
    }

    pub fn error(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut response = Self::build(status, None, message);
        response.err = Some(code.into());
        response
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// An empty list answers `data: null`.
    pub fn list(items: Vec<T>, message: impl Into<String>) -> Self {
        let data = (!items.is_empty()).then_some(items);
        Self::build(StatusCode::OK, data, message)
    }

    pub fn page(page: Page<T>, message: impl Into<String>) -> Self {
        let mut response = Self::list(page.items, message);
        response.pagination = Some(page.pagination);
        response
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
