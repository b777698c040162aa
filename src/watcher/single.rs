use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::EventSource;
use super::Lifecycle;
use super::ResourceEvent;
use crate::CallbackError;
use crate::ChangeKind;
use crate::Resource;
use crate::Result;
use crate::WatchError;

pub type OnResourceChange<R> = Arc<dyn Fn(ChangeKind, &R) -> std::result::Result<(), CallbackError> + Send + Sync>;

/// Watches a single resource and invokes the callback synchronously for every
/// event after the initial sync and before stop. Keeps no store and does no
/// batching.
pub struct SingleWatcher<R: Resource> {
    callback: OnResourceChange<R>,
    synced: AtomicBool,
    lifecycle: Lifecycle,
}

impl<R: Resource> SingleWatcher<R> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ChangeKind, &R) -> std::result::Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            synced: AtomicBool::new(false),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Same start semantics as [`crate::Watcher::start`].
    pub async fn start<S: EventSource<R>>(
        &self,
        mut source: S,
    ) -> Result<()> {
        if self.lifecycle.is_stopped() {
            return Err(WatchError::AlreadyStopped.into());
        }
        if !self.lifecycle.begin() {
            debug!("single watcher already running, waiting for stop");
            self.lifecycle.wait_stopped().await;
            return Ok(());
        }
        info!("single watcher started");
        self.lifecycle.drive(&mut source, |event| self.dispatch(event)).await
    }

    pub fn stop(&self) {
        if self.lifecycle.stop() {
            info!("single watcher stopped");
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
        resource: R,
    ) {
        self.notify(ChangeKind::Created, &resource);
    }

    pub fn handle_update(
        &self,
        _old: R,
        new: R,
    ) {
        self.notify(ChangeKind::Modified, &new);
    }

    pub fn handle_delete(
        &self,
        resource: R,
    ) {
        self.notify(ChangeKind::Deleted, &resource);
    }

    pub fn mark_synced(&self) {
        if !self.synced.swap(true, Ordering::AcqRel) {
            debug!("single watcher synced");
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    fn notify(
        &self,
        kind: ChangeKind,
        resource: &R,
    ) {
        if !self.is_synced() || self.lifecycle.is_stopped() {
            return;
        }
        if let Err(e) = (self.callback)(kind, resource) {
            warn!(resource = %resource.id(), %kind, error = %e, "change callback failed");
        }
    }
}
