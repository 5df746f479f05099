//! HTTP 에러 응답.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::WorkerError;

/// 에러 응답 본문.
///
/// ```json
/// { "status": "error", "code": "INVALID_TICKER", "message": "..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub status: &'static str,
    pub code: String,
    pub message: String,
}

/// 핸들러 에러.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse {
                status: "error",
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::Core(e) => Self::bad_request("INVALID_REQUEST", e.to_string()),
            other => {
                // 내부 에러 내용은 로그에만 남김
                error!(error = %other, "Request failed");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UNAVAILABLE",
                    "Service temporarily unavailable, try again shortly",
                )
            }
        }
    }
}

impl From<edge_data::DataError> for ApiError {
    fn from(err: edge_data::DataError) -> Self {
        WorkerError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
