use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::trace;

use super::ChangeKind;
use super::ChangeStats;
use crate::Resource;
use crate::Result;
use crate::Store;
use crate::WatchError;

/// Consumer callback receiving the store and the aggregated changes.
pub type OnChange<R> = Arc<dyn Fn(Arc<dyn Store<R>>, ChangeStats) + Send + Sync>;

#[derive(Debug)]
struct DebounceState {
    pending: ChangeStats,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever a timer is armed or cancelled so a timer that already
    /// woke up cannot deliver after a flush.
    generation: u64,
    sync_mode: bool,
    initial_created: usize,
    /// Set by the final flush; later records are dropped.
    closed: bool,
}

struct Inner<R: Resource> {
    interval: Duration,
    suppress_during_sync: bool,
    on_change: OnChange<R>,
    store: Arc<dyn Store<R>>,
    runtime: Handle,
    state: Mutex<DebounceState>,
}

/// Aggregates change counters and calls the consumer at most once per
/// interval.
///
/// The first record after a quiet period arms a timer; records arriving
/// before it fires only bump counters. When the timer fires the counters are
/// snapshotted and reset, and the callback runs unless the snapshot is empty
/// or the batch falls in the initial sync while suppression is on.
/// [`Debouncer::flush`] delivers immediately and ignores suppression.
///
/// The callback always runs outside the state lock. Timers run on the
/// runtime current at construction, so records may come from any thread.
pub struct Debouncer<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for Debouncer<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> Debouncer<R> {
    /// Fails with [`WatchError::NoRuntime`] outside a tokio runtime.
    pub fn new(
        interval: Duration,
        on_change: OnChange<R>,
        store: Arc<dyn Store<R>>,
        suppress_during_sync: bool,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| WatchError::NoRuntime(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                interval,
                suppress_during_sync,
                on_change,
                store,
                runtime,
                state: Mutex::new(DebounceState {
                    pending: ChangeStats::default(),
                    timer: None,
                    generation: 0,
                    sync_mode: true,
                    initial_created: 0,
                    closed: false,
                }),
            }),
        })
    }

    pub fn record_create(&self) {
        self.record(ChangeKind::Created);
    }

    pub fn record_update(&self) {
        self.record(ChangeKind::Modified);
    }

    pub fn record_delete(&self) {
        self.record(ChangeKind::Deleted);
    }

    pub fn record(
        &self,
        kind: ChangeKind,
    ) {
        let mut state = self.inner.state.lock();
        if state.closed {
            trace!(%kind, "debouncer closed, change dropped");
            return;
        }
        state.pending.record(kind);
        if kind == ChangeKind::Created && state.sync_mode {
            state.initial_created += 1;
        }
        if state.timer.is_some() {
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        let interval = self.inner.interval;
        let inner = Arc::downgrade(&self.inner);
        state.timer = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            Inner::fire(&inner, generation);
        }));
        trace!(generation, ?interval, "debounce timer armed");
    }

    /// Cancels the pending timer and delivers whatever accumulated, even
    /// during a suppressed sync. Returns whether the callback ran.
    pub fn flush(&self) -> bool {
        self.deliver_now(false)
    }

    /// Final flush. Every later record is dropped and no timer is armed again.
    pub fn close(&self) -> bool {
        self.deliver_now(true)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    fn deliver_now(
        &self,
        close: bool,
    ) -> bool {
        let snapshot = {
            let mut state = self.inner.state.lock();
            state.closed |= close;
            match state.cancel_and_take() {
                Some(snapshot) => snapshot,
                None => return false,
            }
        };
        debug!(?snapshot, close, "debounce flush");
        (self.inner.on_change)(self.inner.store.clone(), snapshot);
        true
    }

    /// Cancels the pending timer and drops the accumulated counters.
    pub fn discard(&self) -> ChangeStats {
        let mut state = self.inner.state.lock();
        let dropped = state.cancel_and_take().unwrap_or_default();
        if !dropped.is_empty() {
            debug!(?dropped, "debounce counters discarded");
        }
        dropped
    }

    pub fn set_sync_mode(
        &self,
        enabled: bool,
    ) {
        self.inner.state.lock().sync_mode = enabled;
    }

    pub fn is_sync_mode(&self) -> bool {
        self.inner.state.lock().sync_mode
    }

    /// Creates recorded while sync mode was on, regardless of whether a
    /// suppressed timer already reset the pending counters.
    pub fn initial_count(&self) -> usize {
        self.inner.state.lock().initial_created
    }

    /// Counters accumulated since the last delivery.
    pub fn pending(&self) -> ChangeStats {
        let state = self.inner.state.lock();
        ChangeStats {
            is_initial_sync: state.sync_mode,
            ..state.pending
        }
    }
}

impl DebounceState {
    fn cancel_and_take(&mut self) -> Option<ChangeStats> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        let mut snapshot = std::mem::take(&mut self.pending);
        snapshot.is_initial_sync = self.sync_mode;
        (!snapshot.is_empty()).then_some(snapshot)
    }
}

impl<R: Resource> Inner<R> {
    fn fire(
        inner: &Weak<Inner<R>>,
        generation: u64,
    ) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let snapshot = {
            let mut state = inner.state.lock();
            if state.generation != generation || state.timer.is_none() {
                return;
            }
            state.timer = None;
            let mut snapshot = std::mem::take(&mut state.pending);
            snapshot.is_initial_sync = state.sync_mode;
            if snapshot.is_empty() {
                return;
            }
            if state.sync_mode && inner.suppress_during_sync {
                debug!(?snapshot, "debounced changes suppressed during initial sync");
                return;
            }
            snapshot
        };
        debug!(?snapshot, "debounce timer fired");
        (inner.on_change)(inner.store.clone(), snapshot);
    }
}
