//! HTTP route handlers.
//!
//! Handlers are thin: they extract, call into [`crate::memory`], and shape
//! JSON. Every failure leaves as [`ApiError`], whose body is `{"error": "..."}`.

pub mod analytics;
pub mod diagnostics;
pub mod memories;

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::MemoryError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed request: status code plus the message sent to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<MemoryError> for ApiError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            MemoryError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Memory not found"),
            // Logged where the store call failed.
            MemoryError::Store(e) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// `Json` whose rejections (bad syntax, wrong shape, missing content type)
/// come back as a 400 [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
