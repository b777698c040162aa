use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use watch_index::ChangeStats;
use watch_index::FetchError;
use watch_index::ResourceFetcher;
use watch_index::ResourceId;
use watch_index::ResourceType;
use watch_index::Store;
use watch_index::WatcherBuilder;
use watch_index::WatcherConfig;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

pub fn pod(
    namespace: &str,
    name: &str,
    app: &str,
) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "namespace": namespace,
            "name": name,
            "labels": { "app": app },
            "managedFields": [{ "manager": "kubectl", "operation": "Apply" }],
        },
        "spec": { "containers": [{ "name": "main", "image": "nginx" }] },
    })
}

/// Callback invocations captured by [`builder`].
#[derive(Default, Clone)]
pub struct Observed {
    pub changes: Arc<Mutex<Vec<ChangeStats>>>,
    pub synced: Arc<Mutex<Vec<usize>>>,
}

pub fn builder(config: WatcherConfig) -> (WatcherBuilder<Value>, Observed) {
    let observed = Observed::default();
    let changes = observed.changes.clone();
    let synced = observed.synced.clone();
    let builder = WatcherBuilder::new(config)
        .on_change(move |_: Arc<dyn Store<Value>>, stats| changes.lock().push(stats))
        .on_sync_complete(move |_: Arc<dyn Store<Value>>, initial| synced.lock().push(initial));
    (builder, observed)
}

/// Fetcher answering from a fixed set of objects and counting calls.
#[derive(Default)]
pub struct StaticFetcher {
    pub objects: Mutex<Vec<Value>>,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher<Value> for StaticFetcher {
    async fn fetch(
        &self,
        _resource_type: &ResourceType,
        id: &ResourceId,
    ) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .iter()
            .find(|object| object["metadata"]["name"] == id.name.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}
