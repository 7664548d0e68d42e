//! Background maintenance tasks.
//!
//! The record sweeper enforces the store's retention window. It runs on an
//! interval and supports graceful shutdown via a cancellation token: when
//! the token is cancelled the task completes its current iteration and
//! exits cleanly.

use crate::observability::metrics;
use crate::store::VerificationStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Default sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Run the record retention sweeper loop.
///
/// Periodically prunes records past the store's retention window and
/// refreshes the record-count gauge. A store without a TTL makes every
/// sweep a no-op, so the task is spawned unconditionally.
pub async fn start_record_sweeper(
    store: Arc<VerificationStore>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.prune_expired();
                if removed > 0 {
                    metrics::record_store_pruned(removed);
                    info!(
                        target: "tv.tasks.sweeper",
                        removed,
                        remaining = store.len(),
                        "Pruned expired verification records"
                    );
                }
                metrics::set_store_records(store.len());
            }
            _ = cancel_token.cancelled() => {
                info!(
                    target: "tv.tasks.sweeper",
                    "Record sweeper received shutdown signal, exiting"
                );
                break;
            }
        }
    }
}
