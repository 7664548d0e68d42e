//! Health check handlers.
//!
//! Provides health check endpoints for Kubernetes liveness and readiness
//! probes.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the store and authority configuration

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Returns a simple "OK" response to indicate the process is running.
/// Does NOT check any dependencies - failure means the process is
/// hung/deadlocked.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Checks whether the service can handle traffic. Returns 200 if ready,
/// 503 if not ready.
///
/// ## Checks
///
/// 1. Verification store - process-local, always available
/// 2. Trust authority - endpoint configured
///
/// The authority is not probed on every readiness check; its reachability
/// surfaces through verification metrics instead.
#[tracing::instrument(skip_all, name = "tv.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.config.authority_url.is_empty() {
        tracing::warn!("Readiness check failed: authority URL not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                store: Some("healthy"),
                authority: Some("unconfigured"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            store: Some("healthy"),
            authority: Some("configured"),
            error: None,
        }),
    )
}
