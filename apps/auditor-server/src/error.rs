//! Error types for the auditor server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use doc_extract::ExtractError;
use report_engine::ReportError;
use serde::Serialize;
use shared_types::AuditError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Extract(#[from] ExtractError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Report(#[from] ReportError),

    #[error("{0}")]
    Audit(#[from] AuditError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Extract(ExtractError::UnsupportedFormat(_)) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
            }
            ServerError::Extract(ExtractError::CorruptFile { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CORRUPT_FILE")
            }
            ServerError::Extract(ExtractError::EmptyDocument) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_DOCUMENT")
            }
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::Report(e @ ReportError::Timeout(_)) => {
                (StatusCode::REQUEST_TIMEOUT, e.code())
            }
            ServerError::Report(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
            ServerError::Audit(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AUDIT_ERROR"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::warn!(code, error = %self, "request rejected");
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
