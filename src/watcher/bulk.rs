use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::EventSource;
use super::Lifecycle;
use super::ResourceEvent;
use super::SyncCell;
use super::SyncState;
use crate::spawn_cache_janitor;
use crate::Debouncer;
use crate::Indexer;
use crate::Resource;
use crate::Result;
use crate::Store;
use crate::StoreType;
use crate::WatchError;
use crate::WatcherConfig;

/// Called once when the initial sync completes, with the number of resources
/// loaded during it.
pub type OnSyncComplete<R> = Arc<dyn Fn(Arc<dyn Store<R>>, usize) + Send + Sync>;

/// Keeps an indexed store in step with an event source and reports
/// aggregated changes through a debouncer.
///
/// Build with [`crate::WatcherBuilder`].
pub struct Watcher<R: Resource> {
    pub(super) config: WatcherConfig,
    pub(super) indexer: Indexer,
    pub(super) store: Arc<dyn Store<R>>,
    pub(super) debouncer: Debouncer<R>,
    pub(super) on_sync_complete: Option<OnSyncComplete<R>>,
    pub(super) sync: SyncCell,
    pub(super) lifecycle: Lifecycle,
}

impl<R: Resource> Watcher<R> {
    /// Consumes `source` until [`Watcher::stop`] is called.
    ///
    /// Only the first call runs the event loop; later calls wait for the
    /// watcher to stop. Fails with [`WatchError::AlreadyStopped`] after a stop
    /// and with [`WatchError::SourceClosed`] if the source ends first, after
    /// flushing pending changes.
    pub async fn start<S: EventSource<R>>(
        &self,
        mut source: S,
    ) -> Result<()> {
        if self.lifecycle.is_stopped() {
            return Err(WatchError::AlreadyStopped.into());
        }
        if !self.lifecycle.begin() {
            debug!("watcher already running, waiting for stop");
            self.lifecycle.wait_stopped().await;
            return Ok(());
        }

        self.sync.begin();
        info!(
            kind = %self.config.resource.kind,
            index_by = ?self.config.index_by,
            store_type = ?self.config.store_type,
            "watcher started"
        );

        let janitor = self.spawn_janitor();
        let result = self.lifecycle.drive(&mut source, |event| self.dispatch(event)).await;
        if let Some(janitor) = janitor {
            janitor.abort();
        }
        if result.is_err() {
            self.debouncer.flush();
        }
        result
    }

    /// Idempotent. Delivers any pending changes before returning; events
    /// handled afterwards are dropped.
    pub fn stop(&self) {
        if self.lifecycle.stop() {
            self.debouncer.close();
            info!(size = self.store.len(), "watcher stopped");
        }
    }

    pub fn dispatch(
        &self,
        event: ResourceEvent<R>,
    ) {
        match event {
            ResourceEvent::Added(resource) => self.handle_add(resource),
            ResourceEvent::Updated { old, new } => self.handle_update(old, new),
            ResourceEvent::Deleted(resource) => self.handle_delete(resource),
            ResourceEvent::Synced => self.mark_synced(),
        }
    }

    pub fn handle_add(
        &self,
        mut resource: R,
    ) {
        if self.dropped_after_stop("add") {
            return;
        }
        let id = resource.id();
        let key = match self.indexer.process(&mut resource) {
            Ok(key) => key,
            Err(e) => {
                warn!(resource = %id, error = %e, "dropping add event");
                return;
            }
        };
        if let Err(e) = self.store.add(resource, key.clone()) {
            warn!(resource = %id, %key, error = %e, "failed to store added resource");
            return;
        }
        trace!(resource = %id, %key, "resource added");
        self.debouncer.record_create();
    }

    /// A changed index key first drops the stale entry under the old key.
    pub fn handle_update(
        &self,
        old: R,
        mut new: R,
    ) {
        if self.dropped_after_stop("update") {
            return;
        }
        let id = new.id();
        let key = match self.indexer.process(&mut new) {
            Ok(key) => key,
            Err(e) => {
                warn!(resource = %id, error = %e, "dropping update event");
                return;
            }
        };

        match self.indexer.extract(&old) {
            Ok(old_key) if old_key != key => match self.store.remove(&old.id(), &old_key) {
                Ok(removed) => debug!(resource = %id, %old_key, %key, removed, "index key changed"),
                Err(e) => warn!(resource = %id, %old_key, error = %e, "failed to remove stale entry"),
            },
            Ok(_) => {}
            Err(e) => trace!(resource = %id, error = %e, "previous key unavailable"),
        }

        if let Err(e) = self.store.update(new, key.clone()) {
            warn!(resource = %id, %key, error = %e, "failed to store updated resource");
            return;
        }
        trace!(resource = %id, %key, "resource updated");
        self.debouncer.record_update();
    }

    /// Removes every resource sharing the deleted resource's key.
    pub fn handle_delete(
        &self,
        resource: R,
    ) {
        if self.dropped_after_stop("delete") {
            return;
        }
        let id = resource.id();
        let key = match self.indexer.extract(&resource) {
            Ok(key) => key,
            Err(e) => {
                warn!(resource = %id, error = %e, "dropping delete event");
                return;
            }
        };
        match self.store.delete(&key) {
            Ok(removed) => trace!(resource = %id, %key, removed, "resource deleted"),
            Err(e) => {
                warn!(resource = %id, %key, error = %e, "failed to delete resource");
                return;
            }
        }
        self.debouncer.record_delete();
    }

    /// Ends the initial sync. Only the first call has any effect.
    pub fn mark_synced(&self) {
        if self.dropped_after_stop("synced") || !self.sync.complete() {
            return;
        }
        let initial = self.debouncer.initial_count();
        if self.config.call_on_change_during_sync {
            self.debouncer.flush();
        } else {
            self.debouncer.discard();
        }
        self.debouncer.set_sync_mode(false);
        info!(initial, size = self.store.len(), "initial sync complete");

        if let Some(on_sync_complete) = &self.on_sync_complete {
            on_sync_complete(self.store.clone(), initial);
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.get()
    }

    pub fn store(&self) -> Arc<dyn Store<R>> {
        self.store.clone()
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    fn dropped_after_stop(
        &self,
        event: &str,
    ) -> bool {
        let stopped = self.lifecycle.is_stopped();
        if stopped {
            trace!(event, "watcher stopped, event dropped");
        }
        stopped
    }

    fn spawn_janitor(&self) -> Option<JoinHandle<()>> {
        if self.config.store_type != StoreType::Cached {
            return None;
        }
        let interval = self.config.cache_janitor_interval()?;
        Some(spawn_cache_janitor(self.store.clone(), interval, self.lifecycle.subscribe()))
    }
}
