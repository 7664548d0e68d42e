use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Retry hint returned with 500 responses, in seconds.
const RETRY_AFTER_SECONDS: &str = "2";

#[derive(Debug, Error)]
pub enum TvError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Trust authority unavailable: {0}")]
    AuthorityUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for TvError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            TvError::BadRequest(reason) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone()),
            // Collaborator detail stays in the logs; callers get a coarse
            // message and a retry hint.
            TvError::AuthorityUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERVICE_ERROR",
                "Verification is temporarily unavailable".to_string(),
            ),
            TvError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERVICE_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            if let Ok(value) = header::HeaderValue::from_str(RETRY_AFTER_SECONDS) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
