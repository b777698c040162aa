use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::sleep;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::pod;
use crate::ChangeStats;
use crate::Error;
use crate::IndexKey;
use crate::Store;
use crate::StoreType;
use crate::WatchError;
use crate::WatcherConfig;

#[derive(Default, Clone)]
struct Recorder {
    changes: Arc<Mutex<Vec<ChangeStats>>>,
    synced: Arc<Mutex<Vec<usize>>>,
}

fn config(call_on_change_during_sync: bool) -> WatcherConfig {
    WatcherConfig {
        index_by: vec!["metadata.namespace".into(), "metadata.name".into()],
        ignore_fields: vec!["metadata.managedFields".into()],
        debounce_interval_in_ms: 100,
        call_on_change_during_sync,
        ..Default::default()
    }
}

fn watcher(config: WatcherConfig) -> (Watcher<Value>, Recorder) {
    let recorder = Recorder::default();
    let changes = recorder.changes.clone();
    let synced = recorder.synced.clone();
    let watcher = WatcherBuilder::new(config)
        .on_change(move |_store: Arc<dyn Store<Value>>, stats| changes.lock().push(stats))
        .on_sync_complete(move |_store: Arc<dyn Store<Value>>, initial| synced.lock().push(initial))
        .build()
        .unwrap();
    (watcher, recorder)
}

#[tokio::test(start_paused = true)]
async fn test_changes_during_sync_are_reported_by_sync_complete() {
    enable_logger();
    let (watcher, recorder) = watcher(config(false));

    watcher.handle_add(pod("ns", "a"));
    watcher.handle_add(pod("ns", "b"));
    sleep(Duration::from_millis(150)).await;
    assert!(recorder.changes.lock().is_empty());

    watcher.mark_synced();
    assert_eq!(*recorder.synced.lock(), vec![2]);
    assert_eq!(watcher.sync_state(), SyncState::Synced);

    sleep(Duration::from_millis(150)).await;
    assert!(recorder.changes.lock().is_empty());

    watcher.handle_add(pod("ns", "c"));
    sleep(Duration::from_millis(150)).await;
    let changes = recorder.changes.lock();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].created, 1);
    assert!(!changes[0].is_initial_sync);
    assert_eq!(watcher.store().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_call_on_change_during_sync_marks_initial_batches() {
    let (watcher, recorder) = watcher(config(true));

    watcher.handle_add(pod("ns", "a"));
    sleep(Duration::from_millis(150)).await;
    {
        let changes = recorder.changes.lock();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_initial_sync);
    }

    watcher.handle_add(pod("ns", "b"));
    watcher.mark_synced();
    {
        let changes = recorder.changes.lock();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].created, 1);
    }
    assert_eq!(*recorder.synced.lock(), vec![2]);
}

#[tokio::test]
async fn test_mark_synced_fires_once() {
    let (watcher, recorder) = watcher(config(false));
    watcher.handle_add(pod("ns", "a"));

    assert!(watcher.debouncer.is_sync_mode());

    watcher.mark_synced();
    watcher.mark_synced();

    assert_eq!(*recorder.synced.lock(), vec![1]);
    assert!(!watcher.debouncer.is_sync_mode());
}

#[tokio::test(start_paused = true)]
async fn test_events_after_stop_are_dropped() {
    let (watcher, recorder) = watcher(config(true));
    watcher.handle_add(pod("ns", "a"));

    watcher.stop();
    assert_eq!(recorder.changes.lock().len(), 1);
    assert!(watcher.debouncer.is_closed());

    watcher.handle_add(pod("ns", "z"));
    watcher.handle_delete(pod("ns", "a"));
    watcher.mark_synced();
    sleep(Duration::from_millis(150)).await;

    assert_eq!(recorder.changes.lock().len(), 1);
    assert!(recorder.synced.lock().is_empty());
    assert_eq!(watcher.store().len(), 1);
}

#[test]
fn test_handlers_run_from_threads_outside_the_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let (watcher, recorder) = {
        let _guard = runtime.enter();
        watcher(config(true))
    };

    watcher.handle_add(pod("ns", "a"));
    assert_eq!(watcher.store().len(), 1);
    assert_eq!(watcher.debouncer.pending().created, 1);

    runtime.block_on(async { sleep(Duration::from_millis(150)).await });
    let changes = recorder.changes.lock();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].created, 1);
}

#[test]
fn test_build_outside_runtime_fails() {
    let result = WatcherBuilder::<Value>::new(config(false)).build();
    assert!(matches!(result, Err(Error::Watch(WatchError::NoRuntime(_)))));
}

#[tokio::test]
async fn test_ignored_fields_are_stripped_before_storage() {
    let (watcher, _) = watcher(config(false));
    watcher.handle_add(pod("ns", "a"));

    let found = watcher.store().get(&IndexKey::from(["ns", "a"])).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0]["metadata"].get("managedFields").is_none());
    assert_eq!(found[0]["metadata"]["name"], "a");
}

#[tokio::test]
async fn test_update_with_changed_key_drops_stale_entry() {
    let config = WatcherConfig {
        index_by: vec!["metadata.labels.app".into()],
        ..config(false)
    };
    let (watcher, _) = watcher(config);
    let old = pod("ns", "a");
    watcher.handle_add(old.clone());

    let mut new = old.clone();
    new["metadata"]["labels"]["app"] = Value::from("web");
    watcher.handle_update(old, new);

    let store = watcher.store();
    assert_eq!(store.len(), 1);
    assert!(store.get(&IndexKey::from(["a"])).await.unwrap().is_empty());
    assert_eq!(store.get(&IndexKey::from(["web"])).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_clears_the_whole_slot() {
    let config = WatcherConfig {
        index_by: vec!["metadata.namespace".into()],
        ..config(false)
    };
    let (watcher, _) = watcher(config);
    watcher.handle_add(pod("ns", "a"));
    watcher.handle_add(pod("ns", "b"));
    watcher.handle_add(pod("other", "c"));

    watcher.handle_delete(pod("ns", "a"));

    let store = watcher.store();
    assert_eq!(store.len(), 1);
    assert_eq!(store.list().await.unwrap()[0]["metadata"]["name"], "c");
}

#[tokio::test]
async fn test_event_without_key_is_dropped() {
    let (watcher, _) = watcher(config(false));
    watcher.handle_add(serde_json::json!({"metadata": {"namespace": "ns"}}));
    assert!(watcher.store().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_runs_until_stop() {
    let (watcher, recorder) = watcher(config(false));
    let watcher = Arc::new(watcher);
    let (tx, rx) = event_channel(16);

    let running = watcher.clone();
    let handle = tokio::spawn(async move { running.start(rx).await });

    tx.send(ResourceEvent::Added(pod("ns", "a"))).await.unwrap();
    tx.send(ResourceEvent::Synced).await.unwrap();
    tx.send(ResourceEvent::Added(pod("ns", "b"))).await.unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(watcher.sync_state(), SyncState::Synced);
    assert_eq!(*recorder.synced.lock(), vec![1]);

    watcher.stop();
    watcher.stop();
    handle.await.unwrap().unwrap();

    // pending change delivered by stop
    let changes = recorder.changes.lock();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].created, 1);
    assert_eq!(watcher.store().len(), 2);
}

#[tokio::test]
async fn test_second_start_waits_for_stop() {
    let (watcher, _) = watcher(config(false));
    let watcher = Arc::new(watcher);
    let (_tx, rx) = event_channel::<Value>(4);
    let (_tx2, rx2) = event_channel::<Value>(4);

    let first = watcher.clone();
    let first = tokio::spawn(async move { first.start(rx).await });
    sleep(Duration::from_millis(20)).await;
    let second = watcher.clone();
    let second = tokio::spawn(async move { second.start(rx2).await });
    sleep(Duration::from_millis(20)).await;

    watcher.stop();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_start_after_stop_fails() {
    let (watcher, _) = watcher(config(false));
    watcher.stop();

    let (_tx, rx) = event_channel::<Value>(4);
    let err = watcher.start(rx).await.unwrap_err();
    assert!(matches!(err, Error::Watch(WatchError::AlreadyStopped)));
}

#[tokio::test(start_paused = true)]
async fn test_closed_source_flushes_and_fails() {
    let (watcher, recorder) = watcher(config(true));
    let (tx, rx) = event_channel(4);
    tx.send(ResourceEvent::Added(pod("ns", "a"))).await.unwrap();
    drop(tx);

    let err = watcher.start(rx).await.unwrap_err();

    assert!(matches!(err, Error::Watch(WatchError::SourceClosed)));
    assert_eq!(recorder.changes.lock().len(), 1);
}

#[test]
fn test_build_rejects_cached_store_without_fetcher() {
    let mut config = config(false);
    config.store_type = StoreType::Cached;
    config.resource.kind = "Secret".into();

    let result = WatcherBuilder::<Value>::new(config).build();
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_build_rejects_filtering_an_index_field() {
    let config = WatcherConfig {
        ignore_fields: vec!["metadata".into()],
        ..config(false)
    };
    let result = WatcherBuilder::<Value>::new(config).build();
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_build_rejects_empty_index_by() {
    let config = WatcherConfig {
        index_by: Vec::new(),
        ..config(false)
    };
    assert!(WatcherBuilder::<Value>::new(config).build().is_err());
}
