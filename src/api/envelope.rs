//! Response envelope shared by every `/api/v2` endpoint.
//!
//! Success bodies are `{ "data": T, "meta": {..} }`, failures are
//! `{ "error": { "code", "message" }, "meta": {..} }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::error::EvaluateError;

/// Envelope metadata.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: "2",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            axum::Json(Self {
                data,
                meta: ResponseMeta::default(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn not_found(message: impl Into<String>) -> Response {
        Self::build(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Response {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    /// Evaluation failures are caller errors: bad series or bad gains.
    pub fn evaluation(err: &EvaluateError) -> Response {
        let code = match err {
            EvaluateError::InsufficientData(_) => "INSUFFICIENT_DATA",
            EvaluateError::UnorderedSeries { .. } => "UNORDERED_SERIES",
            EvaluateError::InvalidGains { .. } => "INVALID_GAINS",
        };
        Self::build(StatusCode::BAD_REQUEST, code, err.to_string())
    }
}
