//! Metrics definitions for the token verifier.
//!
//! All metrics follow Prometheus naming conventions:
//! - `tv_` prefix for the Token Verifier
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `decision`: 4 values (valid, invalid, expired, malformed)
//! - `status`: 2 values (success, error)
//! - `path`: normalized to the known route set plus `/other`
//! - `method`, `status_code`: bounded by HTTP

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called once at startup, before any metrics are recorded.
/// Histogram buckets are aligned with the verify path's latency profile:
/// the in-memory store answers in microseconds, the authority call
/// dominates when it runs.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g. already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Verification duration - cache hits are sub-millisecond, authority
        // round-trips take tens to hundreds of milliseconds
        .set_buckets_for_metric(
            Matcher::Prefix("tv_verification".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set verification buckets: {e}"))?
        // Authority latency - external HTTP call bounded by the client timeout
        .set_buckets_for_metric(
            Matcher::Prefix("tv_authority".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set authority buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Verification Metrics
// ============================================================================

/// Record a completed verification and its decision.
///
/// Metric: `tv_verification_duration_seconds`, `tv_verifications_total`
/// Labels: `decision`
pub fn record_verification(decision: &str, duration: Duration) {
    histogram!("tv_verification_duration_seconds", "decision" => decision.to_string())
        .record(duration.as_secs_f64());

    counter!("tv_verifications_total", "decision" => decision.to_string()).increment(1);
}

/// Record a verification that failed before producing a decision.
///
/// Metric: `tv_verification_failures_total`
/// Labels: `reason` (authority_unavailable, internal)
pub fn record_verification_failure(reason: &str) {
    counter!("tv_verification_failures_total", "reason" => reason.to_string()).increment(1);
}

// ============================================================================
// Trust Authority Metrics
// ============================================================================

/// Record a trust-authority round trip.
///
/// Metric: `tv_authority_requests_total`, `tv_authority_request_duration_seconds`
/// Labels: `status` (success, error)
pub fn record_authority_check(status: &str, duration: Duration) {
    histogram!("tv_authority_request_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("tv_authority_requests_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Update the verification-record count gauge.
///
/// Metric: `tv_store_records`
pub fn set_store_records(count: usize) {
    gauge!("tv_store_records").set(count as f64);
}

/// Record records removed by the retention sweeper.
///
/// Metric: `tv_store_pruned_total`
pub fn record_store_pruned(count: usize) {
    counter!("tv_store_pruned_total").increment(count as u64);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `tv_http_requests_total`, `tv_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
///
/// This captures ALL HTTP responses including framework-level errors like:
/// - 400 Bad Request (JSON parse errors)
/// - 404 Not Found
/// - 405 Method Not Allowed
/// - 415 Unsupported Media Type (wrong Content-Type)
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("tv_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.clone(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("tv_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Normalize path to prevent label cardinality explosion.
///
/// The route set is static, so anything outside it collapses to `/other`.
fn normalize_path(path: &str) -> String {
    match path {
        "/" | "/health" | "/ready" | "/metrics" | "/api/v1/tokens/verify" => path.to_string(),
        _ => "/other".to_string(),
    }
}
