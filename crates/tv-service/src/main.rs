use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tv_service::config::Config;
use tv_service::observability::metrics;
use tv_service::routes::{self, AppState};
use tv_service::services::AuthorityClient;
use tv_service::store::VerificationStore;
use tv_service::tasks;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tv_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Token Verifier");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Install the Prometheus recorder before anything records a metric
    let metrics_handle = metrics::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    // Verification store and trust-authority client
    let store = Arc::new(VerificationStore::new(config.record_ttl));
    let authority =
        AuthorityClient::new(config.authority_url.clone(), config.authority_timeout).map_err(
            |e| {
                error!("Failed to build authority client: {}", e);
                e
            },
        )?;

    // Background record retention sweeper
    let cancel_token = CancellationToken::new();
    let sweeper = tokio::spawn(tasks::start_record_sweeper(
        Arc::clone(&store),
        Duration::from_secs(tasks::DEFAULT_SWEEP_INTERVAL_SECONDS),
        cancel_token.clone(),
    ));

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState {
        config,
        store,
        authority: Arc::new(authority),
    });

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Token Verifier listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    // The sweeper exits once the cancellation token fires
    sweeper.await?;

    Ok(())
}

/// Wait for ctrl-c and propagate shutdown to background tasks.
async fn shutdown_signal(cancel_token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
    cancel_token.cancel();
}
