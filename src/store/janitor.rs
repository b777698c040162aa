use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::trace;

use super::Store;
use crate::utils::async_task::spawn_task;
use crate::Resource;

/// Periodically evicts expired cache entries until `shutdown` flips to true
/// or its sender is dropped.
pub fn spawn_cache_janitor<R: Resource>(
    store: Arc<dyn Store<R>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    spawn_task("cache_janitor", async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        debug!(?interval, "cache janitor started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let evicted = store.evict_expired();
                    trace!(evicted, remaining = store.len(), "cache janitor pass");
                }
            }
        }
        debug!("cache janitor stopped");
        Ok(())
    })
}
