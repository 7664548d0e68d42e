//! Token verification endpoint.
//!
//! `POST /api/v1/tokens/verify` accepts `{ "token": string }` and returns
//! the verification decision. Negative decisions (`invalid`, `expired`,
//! `malformed`) are processed outcomes and return 200; only envelope errors
//! (400) and collaborator failures (500) use error statuses.

use crate::errors::TvError;
use crate::models::{VerificationDecision, VerifyRequest};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

/// Correlation header echoed (or generated) on every verify response.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Handler for POST /api/v1/tokens/verify
///
/// Verify a single bearer token against the store and the trust authority.
///
/// # Response
///
/// - 200 OK: Decision returned (including negative decisions)
/// - 400 Bad Request: Envelope unparsable or missing the `token` field
/// - 500 Internal Server Error: Trust authority unavailable
#[instrument(
    skip_all,
    name = "tv.tokens.verify",
    fields(
        method = "POST",
        endpoint = "/api/v1/tokens/verify",
    )
)]
pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, TvError> {
    let start = Instant::now();
    let request_id = correlation_id(&headers);

    // Deserialize the envelope manually to return 400 (not Axum's default
    // 422) and to reject it before the verifier runs.
    let request: VerifyRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(
            target: "tv.handlers.verify",
            request_id = %request_id,
            error = %e,
            "Invalid request envelope"
        );
        TvError::BadRequest("Request body must be JSON with a token field".to_string())
    })?;

    let decision = verify_and_record(&state, &request.token, start, &request_id).await?;

    let mut response = Json(decision).into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    Ok(response)
}

/// Run the verifier and record outcome metrics.
async fn verify_and_record(
    state: &AppState,
    token: &str,
    start: Instant,
    request_id: &str,
) -> Result<VerificationDecision, TvError> {
    match crate::services::verifier::verify(&state.store, state.authority.as_ref(), token).await {
        Ok(decision) => {
            metrics::record_verification(decision.decision.as_str(), start.elapsed());
            metrics::set_store_records(state.store.len());
            Ok(decision)
        }
        Err(e) => {
            let reason = match &e {
                TvError::AuthorityUnavailable(_) => "authority_unavailable",
                _ => "internal",
            };
            metrics::record_verification_failure(reason);
            tracing::warn!(
                target: "tv.handlers.verify",
                request_id = %request_id,
                error = %e,
                "Verification failed"
            );
            Err(e)
        }
    }
}

/// Echo the caller's correlation id, or mint one.
fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_echoes_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));

        assert_eq!(correlation_id(&headers), "req-42");
    }

    #[test]
    fn test_correlation_id_generated_when_absent() {
        let headers = HeaderMap::new();
        let id = correlation_id(&headers);

        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_correlation_id_generated_for_non_ascii_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );

        let id = correlation_id(&headers);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
