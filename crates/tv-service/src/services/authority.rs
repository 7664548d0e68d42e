//! Trust-authority HTTP client.
//!
//! The authoritative check for a token is delegated to an external trust
//! authority (e.g. a signature verification service). This module treats it
//! as an opaque capability with a bounded-latency contract.
//!
//! # Security
//!
//! - All requests carry the configured timeout; a hung authority never
//!   holds a verification open indefinitely
//! - Errors are logged server-side with generic messages returned

use crate::errors::TvError;
use crate::observability::metrics;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Connect timeout for authority requests in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 2;

/// Request body for the authority's authenticate endpoint.
#[derive(Debug, Clone, Serialize)]
struct AuthenticateRequest<'a> {
    #[serde(rename = "tokenId")]
    token_id: &'a str,
}

/// Response body from the authority's authenticate endpoint.
#[derive(Debug, Clone, Deserialize)]
struct AuthenticateResponse {
    authentic: bool,
}

/// Trait for the authoritative token check (enables mocking).
#[async_trait::async_trait]
pub trait TrustAuthority: Send + Sync {
    /// Establish ground truth for a token identifier.
    async fn authenticate(&self, token_id: &str) -> Result<bool, TvError>;
}

/// HTTP client for the trust authority.
#[derive(Clone)]
pub struct AuthorityClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL for the authority API.
    base_url: String,
}

impl AuthorityClient {
    /// Create a new authority client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for the authority API (e.g. "http://localhost:8082")
    /// * `timeout` - Per-request timeout for authenticate calls
    ///
    /// # Errors
    ///
    /// Returns `TvError::Internal` if the HTTP client cannot be built.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, TvError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(target: "tv.services.authority", error = %e, "Failed to build HTTP client");
                TvError::Internal
            })?;

        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl TrustAuthority for AuthorityClient {
    #[instrument(skip_all, name = "tv.authority.authenticate")]
    async fn authenticate(&self, token_id: &str) -> Result<bool, TvError> {
        let url = format!("{}/api/v1/tokens/authenticate", self.base_url);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(&AuthenticateRequest { token_id })
            .send()
            .await
            .map_err(|e| {
                metrics::record_authority_check("error", start.elapsed());
                warn!(target: "tv.services.authority", error = %e, "Authority request failed");
                TvError::AuthorityUnavailable("Trust authority is unreachable".to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            let body: AuthenticateResponse = response.json().await.map_err(|e| {
                metrics::record_authority_check("error", start.elapsed());
                error!(target: "tv.services.authority", error = %e, "Failed to parse authority response");
                TvError::AuthorityUnavailable("Trust authority returned an invalid response".to_string())
            })?;

            metrics::record_authority_check("success", start.elapsed());
            Ok(body.authentic)
        } else {
            metrics::record_authority_check("error", start.elapsed());
            warn!(
                target: "tv.services.authority",
                status = %status,
                "Authority returned non-success status"
            );
            Err(TvError::AuthorityUnavailable(format!(
                "Trust authority returned status {}",
                status
            )))
        }
    }
}

/// Mock trust authority module for testing.
///
/// This module provides mock implementations of the trust authority for use
/// in tests.
pub mod mock {

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock trust authority for unit and integration testing.
    pub struct MockAuthority {
        /// Verdicts to return (cycles through them).
        verdicts: Vec<bool>,
        /// Number of calls made.
        call_count: AtomicUsize,
        /// Whether to return errors.
        return_error: bool,
        /// Optional artificial latency, to widen race windows in tests.
        delay: Option<Duration>,
    }

    impl MockAuthority {
        /// Create a mock that vouches for every token.
        pub fn accepting() -> Self {
            Self {
                verdicts: vec![true],
                call_count: AtomicUsize::new(0),
                return_error: false,
                delay: None,
            }
        }

        /// Create a mock that rejects every token.
        pub fn rejecting() -> Self {
            Self {
                verdicts: vec![false],
                call_count: AtomicUsize::new(0),
                return_error: false,
                delay: None,
            }
        }

        /// Create a mock that returns custom verdicts in sequence.
        pub fn with_verdicts(verdicts: Vec<bool>) -> Self {
            Self {
                verdicts,
                call_count: AtomicUsize::new(0),
                return_error: false,
                delay: None,
            }
        }

        /// Create a mock that returns errors.
        pub fn failing() -> Self {
            Self {
                verdicts: vec![],
                call_count: AtomicUsize::new(0),
                return_error: true,
                delay: None,
            }
        }

        /// Add artificial latency before each verdict.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TrustAuthority for MockAuthority {
        async fn authenticate(&self, _token_id: &str) -> Result<bool, TvError> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.return_error {
                return Err(TvError::AuthorityUnavailable(
                    "Mock authority error".to_string(),
                ));
            }

            if self.verdicts.is_empty() {
                return Ok(true);
            }

            let idx = count % self.verdicts.len();
            Ok(self.verdicts.get(idx).copied().unwrap_or(true))
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_accepting() {
            let mock = MockAuthority::accepting();
            assert!(mock.authenticate("abc123").await.unwrap());
            assert_eq!(mock.call_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_rejecting() {
            let mock = MockAuthority::rejecting();
            assert!(!mock.authenticate("abc123").await.unwrap());
        }

        #[tokio::test]
        async fn test_mock_failing() {
            let mock = MockAuthority::failing();
            let result = mock.authenticate("abc123").await;
            assert!(matches!(result, Err(TvError::AuthorityUnavailable(_))));
        }

        #[tokio::test]
        async fn test_mock_cycling_verdicts() {
            let mock = MockAuthority::with_verdicts(vec![true, false]);
            assert!(mock.authenticate("abc123").await.unwrap());
            assert!(!mock.authenticate("abc123").await.unwrap());
            assert!(mock.authenticate("abc123").await.unwrap());
            assert_eq!(mock.call_count(), 3);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_request_serialization() {
        let request = AuthenticateRequest { token_id: "abc123" };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tokenId"], "abc123");
    }

    #[test]
    fn test_authenticate_response_deserialization() {
        let body: AuthenticateResponse = serde_json::from_str(r#"{"authentic":true}"#).unwrap();
        assert!(body.authentic);

        let body: AuthenticateResponse = serde_json::from_str(r#"{"authentic":false}"#).unwrap();
        assert!(!body.authentic);
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let client = AuthorityClient::new(
            "http://localhost:8082".to_string(),
            Duration::from_secs(3),
        );
        assert!(client.is_ok());
    }
}
