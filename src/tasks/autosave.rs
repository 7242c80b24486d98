//! Autosave Task
//!
//! Background task that periodically writes a cache snapshot to disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::CacheStore;

/// Spawns a background task that saves the cache to `path` every `interval`.
///
/// Each save runs on a blocking thread. Failures are logged and the task
/// keeps running, so a transient I/O error only costs one snapshot.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::new());
/// let autosave_handle = spawn_autosave_task(cache.clone(), path, Duration::from_secs(600));
/// // Later, during shutdown:
/// autosave_handle.abort();
/// ```
pub fn spawn_autosave_task(
    cache: Arc<CacheStore<String>>,
    path: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting autosave task to {} every {:?}",
            path.display(),
            interval
        );

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let cache = Arc::clone(&cache);
            let target = path.clone();
            match tokio::task::spawn_blocking(move || cache.save_to_file(&target)).await {
                Ok(Ok(())) => debug!("Autosave completed"),
                Ok(Err(e)) => error!("Autosave to {} failed: {}", path.display(), e),
                Err(e) => error!("Autosave task panicked: {}", e),
            }
        }
    })
}
