//! Prune Task
//!
//! Background task that periodically removes expired entries and enforces
//! capacity, so expired space is reclaimed without waiting for a read.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::TextCacheStore;
use crate::error::CacheError;

/// Spawns a background task that prunes `store` every `interval`.
///
/// The store API is blocking, so each prune runs on tokio's blocking pool.
/// The task exits on its own once the store has been closed; otherwise abort
/// the returned handle during shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(TextCacheStore::open(config)?);
/// let prune_handle = spawn_prune_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
pub fn spawn_prune_task(store: Arc<TextCacheStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting prune task with interval of {:.1} seconds",
            interval.as_secs_f64()
        );

        loop {
            tokio::time::sleep(interval).await;

            let store = store.clone();
            let result = tokio::task::spawn_blocking(move || store.prune(true)).await;

            match result {
                Ok(Ok(report)) if report.removed_count > 0 || report.evicted.evicted_count > 0 => {
                    info!(
                        "Prune: removed {} expired entries ({} bytes), evicted {}",
                        report.removed_count, report.removed_bytes, report.evicted.evicted_count
                    );
                }
                Ok(Ok(_)) => debug!("Prune: nothing to remove"),
                Ok(Err(CacheError::Closed)) => {
                    info!("Cache store closed, stopping prune task");
                    break;
                }
                Ok(Err(err)) => error!(error = %err, "Prune failed"),
                Err(err) => error!(error = %err, "Prune worker panicked"),
            }
        }
    })
}
