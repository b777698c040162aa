use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::watch;
use tracing::warn;

use super::EventSource;
use super::ResourceEvent;
use crate::Resource;
use crate::Result;
use crate::WatchError;

/// One-shot start and stop guards plus the shutdown signal.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    started: AtomicBool,
    stopped: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// True for the first caller only.
    pub(crate) fn begin(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// True for the first caller only; later calls are no-ops.
    pub(crate) fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.shutdown_tx.send_replace(true);
        true
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub(crate) async fn wait_stopped(&self) {
        let mut shutdown = self.subscribe();
        while !*shutdown.borrow_and_update() {
            if shutdown.changed().await.is_err() {
                return;
            }
        }
    }

    /// Pumps events into `dispatch` until stopped (`Ok`) or the source ends
    /// (`SourceClosed`).
    pub(crate) async fn drive<R, S, F>(
        &self,
        source: &mut S,
        mut dispatch: F,
    ) -> Result<()>
    where
        R: Resource,
        S: EventSource<R>,
        F: FnMut(ResourceEvent<R>),
    {
        let mut shutdown = self.subscribe();
        if self.is_stopped() {
            return Ok(());
        }
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => return Ok(()),
                event = source.next() => match event {
                    Some(event) => dispatch(event),
                    None => {
                        warn!("event source closed before stop");
                        return Err(WatchError::SourceClosed.into());
                    }
                },
            }
        }
    }
}
