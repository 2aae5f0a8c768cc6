//! Text Cache - maintenance daemon
//!
//! Opens a cache store from environment configuration and keeps it pruned
//! until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use text_cache::{spawn_prune_task, CacheConfig, TextCacheStore};

/// Main entry point for the cache maintenance daemon.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache store
/// 4. Start background prune task
/// 5. Wait for SIGINT/SIGTERM, then close the store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "text_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting text cache maintenance daemon");

    let config = CacheConfig::from_env().context("loading cache configuration")?;
    info!(
        "Configuration loaded: name={}, directory={}, capacity_bytes={}, default_ttl={:?}, eviction={}, prune_interval={:?}",
        config.name,
        config.directory.display(),
        config.capacity_bytes,
        config.default_ttl,
        config.eviction_policy,
        config.prune_interval
    );

    let prune_interval = config.prune_interval;
    let store = Arc::new(TextCacheStore::open(config).context("opening cache store")?);

    let stats = store.stats().context("reading cache statistics")?;
    info!("Cache store opened: {}", serde_json::to_string(&stats)?);

    let prune_handle = spawn_prune_task(store.clone(), prune_interval);
    info!("Background prune task started");

    shutdown_signal().await;

    prune_handle.abort();
    warn!("Prune task aborted");

    store.close().context("closing cache store")?;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
