use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::error;
use tracing::warn;

use crate::FetchError;
use crate::Result;

/// Runs one fetch under a fixed deadline, independent of caller cancellation.
pub(crate) async fn fetch_with_timeout<T, F>(
    timeout_duration: Duration,
    fetch: F,
) -> std::result::Result<T, FetchError>
where
    F: Future<Output = std::result::Result<T, FetchError>>,
{
    match timeout(timeout_duration, fetch).await {
        Ok(result) => result,
        Err(_) => {
            warn!("fetch timed out after {:?}", timeout_duration);
            Err(FetchError::Timeout(timeout_duration))
        }
    }
}

// Helper function to spawn background tasks that log instead of propagate
pub(crate) fn spawn_task<Fut>(
    name: &str,
    task: Fut,
) -> JoinHandle<()>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        if let Err(e) = task.await {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
    })
}
