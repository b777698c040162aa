use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::async_task::fetch_with_timeout;
use super::async_task::spawn_task;
use crate::Error;
use crate::FetchError;

#[tokio::test]
async fn test_fetch_with_timeout_success() {
    let result = fetch_with_timeout(Duration::from_millis(100), async { Ok::<_, FetchError>(7) }).await;
    assert_eq!(result.unwrap(), 7);
}

#[tokio::test]
async fn test_fetch_with_timeout_passes_through_errors() {
    let result = fetch_with_timeout(Duration::from_millis(100), async {
        Err::<u32, _>(FetchError::NotFound("ns/a".to_string()))
    })
    .await;
    assert!(matches!(result, Err(FetchError::NotFound(name)) if name == "ns/a"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_with_timeout_expires() {
    let result = fetch_with_timeout(Duration::from_millis(100), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<u32, FetchError>(42)
    })
    .await;
    assert!(matches!(result, Err(FetchError::Timeout(d)) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn test_spawn_task() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let handle = spawn_task("test_task", async move {
        counter_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    handle.await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_spawn_task_with_error() {
    let handle = spawn_task("error_task", async move { Err::<(), _>(Error::Fatal("Task error".to_string())) });

    // errors are logged, the handle still completes cleanly
    assert!(handle.await.is_ok());
}
