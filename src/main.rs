//! Snapcache - An in-memory key-value cache server
//!
//! Serves a bounded FIFO/LRU cache with lazy TTL expiration over HTTP and
//! optionally persists it to a snapshot file.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapcache::api::create_router;
use snapcache::{spawn_autosave_task, AppState, Config};

/// Main entry point for the Snapcache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create cache store with configured parameters
/// 4. Restore the snapshot file and start the autosave task, if configured
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM, then save a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Snapcache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, eviction_policy={}, port={}, autosave_file={:?}, autosave_interval={}s",
        config.max_size,
        config.eviction_policy,
        config.server_port,
        config.autosave_file,
        config.autosave_interval
    );

    let state = AppState::from_config(&config);
    info!("Cache store initialized");

    let autosave_handle = match &config.autosave_file {
        Some(path) => {
            if path.exists() {
                state
                    .cache
                    .read_from_file(path)
                    .with_context(|| format!("failed to restore snapshot {}", path.display()))?;
            }
            Some(spawn_autosave_task(
                state.cache.clone(),
                path.clone(),
                Duration::from_secs(config.autosave_interval),
            ))
        }
        None => None,
    };

    let cache = state.cache.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(autosave_handle))
        .await
        .context("server error")?;

    if let Some(path) = &config.autosave_file {
        let target = path.clone();
        tokio::task::spawn_blocking(move || cache.save_to_file(&target))
            .await
            .context("final save task failed")?
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the autosave task and allows graceful shutdown.
async fn shutdown_signal(autosave_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    if let Some(handle) = autosave_handle {
        handle.abort();
        warn!("Autosave task aborted");
    }
}
