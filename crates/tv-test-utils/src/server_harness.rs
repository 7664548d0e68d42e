//! Test server harness for E2E testing
//!
//! Provides `TestTvServer` for spawning real token-verifier instances in
//! tests.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tv_service::config::Config;
use tv_service::routes::{self, AppState};
use tv_service::services::{MockAuthority, TrustAuthority};
use tv_service::store::VerificationStore;

/// Test harness for spawning the token verifier in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_verify_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestTvServer::spawn().await?;
///     let client = reqwest::Client::new();
///
///     let response = client
///         .post(format!("{}/api/v1/tokens/verify", server.url()))
///         .json(&serde_json::json!({ "token": "abc123" }))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestTvServer {
    addr: SocketAddr,
    store: Arc<VerificationStore>,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestTvServer {
    /// Spawn a test server with an always-accepting trust authority.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_authority(Arc::new(MockAuthority::accepting())).await
    }

    /// Spawn a test server with the given trust authority.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    ///
    /// # Returns
    /// * `Ok(TestTvServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn_with_authority(
        authority: Arc<dyn TrustAuthority>,
    ) -> Result<Self, anyhow::Error> {
        // Build configuration for test environment
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "AUTHORITY_URL".to_string(),
                "http://127.0.0.1:8082".to_string(),
            ),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(VerificationStore::new(config.record_ttl));

        let state = Arc::new(AppState {
            config: config.clone(),
            store: Arc::clone(&store),
            authority,
        });

        // Build routes using the service's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the verification store, for state assertions.
    pub fn store(&self) -> &VerificationStore {
        &self.store
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestTvServer {
    fn drop(&mut self) {
        // Explicitly abort the HTTP server task to ensure immediate cleanup
        // when the test completes.
        self._handle.abort();
    }
}

/// Obtain a Prometheus handle for tests.
///
/// The global recorder can only be installed once per process; later servers
/// fall back to a detached recorder whose handle still renders.
fn test_metrics_handle() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
}
