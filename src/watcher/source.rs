use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Resource;

/// Notification delivered by the external watch mechanism.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent<R> {
    Added(R),
    Updated { old: R, new: R },
    Deleted(R),
    /// The source finished delivering its initial listing. Sent once.
    Synced,
}

/// Ordered stream of resource events. `None` means the source is gone.
#[async_trait]
pub trait EventSource<R: Resource>: Send {
    async fn next(&mut self) -> Option<ResourceEvent<R>>;
}

#[async_trait]
impl<R: Resource> EventSource<R> for mpsc::Receiver<ResourceEvent<R>> {
    async fn next(&mut self) -> Option<ResourceEvent<R>> {
        self.recv().await
    }
}

#[async_trait]
impl<R: Resource> EventSource<R> for Box<dyn EventSource<R>> {
    async fn next(&mut self) -> Option<ResourceEvent<R>> {
        self.as_mut().next().await
    }
}

/// Bounded queue between a producer of events and a watcher.
pub fn event_channel<R: Resource>(
    size: usize,
) -> (
    mpsc::Sender<ResourceEvent<R>>,
    mpsc::Receiver<ResourceEvent<R>>,
) {
    mpsc::channel(size)
}
