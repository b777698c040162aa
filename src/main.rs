use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use watch_index::event_channel;
use watch_index::Error;
use watch_index::FetchError;
use watch_index::LogConfig;
use watch_index::Resource;
use watch_index::ResourceEvent;
use watch_index::ResourceFetcher;
use watch_index::ResourceId;
use watch_index::ResourceType;
use watch_index::Result;
use watch_index::Store;
use watch_index::StoreType;
use watch_index::WatchError;
use watch_index::WatchIndexSettings;
use watch_index::WatcherBuilder;

/// One line of the NDJSON input.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum WireEvent {
    Added { object: Value },
    Modified { object: Value },
    Deleted { object: Value },
    Synced,
}

type LastSeen = Arc<DashMap<String, Value>>;

/// Serves cached-store fetches from the last object read for each identity.
struct LastSeenFetcher {
    objects: LastSeen,
}

#[async_trait]
impl ResourceFetcher<Value> for LastSeenFetcher {
    async fn fetch(
        &self,
        _resource_type: &ResourceType,
        id: &ResourceId,
    ) -> std::result::Result<Value, FetchError> {
        self.objects
            .get(&id.cache_key())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = WatchIndexSettings::load(None)?;

    // Initializing Logs
    let _guard = init_observability(&settings.log)?;

    let config = settings.watcher;
    let last_seen: LastSeen = Arc::new(DashMap::new());

    let mut builder = WatcherBuilder::<Value>::new(config.clone())
        .on_change(|store: Arc<dyn Store<Value>>, stats| {
            info!(
                created = stats.created,
                modified = stats.modified,
                deleted = stats.deleted,
                initial = stats.is_initial_sync,
                size = store.len(),
                "resources changed"
            );
        })
        .on_sync_complete(|store: Arc<dyn Store<Value>>, initial| {
            info!(initial, size = store.len(), "initial listing loaded");
        });
    if config.store_type == StoreType::Cached {
        builder = builder.fetcher(Arc::new(LastSeenFetcher {
            objects: last_seen.clone(),
        }));
    }
    let watcher = Arc::new(builder.build()?);

    let (tx, rx) = event_channel(config.event_queue_size);
    let reader = tokio::spawn(async move {
        if let Err(e) = read_events(tx, last_seen).await {
            error!("Failed to read events: {:?}", e);
        }
    });

    // Listen on Shutdown Signal
    let stopper = watcher.clone();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown().await {
            error!("Failed to listen for shutdown: {:?}", e);
        }
        stopper.stop();
    });

    info!("Replaying events from stdin. Waiting for EOF or CTRL+C...");
    match watcher.start(rx).await {
        Ok(()) => {}
        Err(Error::Watch(WatchError::SourceClosed)) => info!("input exhausted"),
        Err(e) => error!("watcher stops: {:?}", e),
    }
    if reader.is_finished() {
        reader.await?;
    } else {
        reader.abort();
    }

    info!(size = watcher.store().len(), "Exiting program.");
    Ok(())
}

async fn read_events(
    tx: mpsc::Sender<ResourceEvent<Value>>,
    last_seen: LastSeen,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| Error::Fatal(format!("failed to read stdin: {e}")))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let wire: WireEvent = match serde_json::from_str(line) {
            Ok(wire) => wire,
            Err(e) => {
                warn!(error = %e, "skipping malformed event");
                continue;
            }
        };

        let event = match wire {
            WireEvent::Added { object } => {
                last_seen.insert(object.id().cache_key(), object.clone());
                ResourceEvent::Added(object)
            }
            WireEvent::Modified { object } => {
                let old = last_seen
                    .insert(object.id().cache_key(), object.clone())
                    .unwrap_or_else(|| object.clone());
                ResourceEvent::Updated { old, new: object }
            }
            WireEvent::Deleted { object } => {
                last_seen.remove(&object.id().cache_key());
                ResourceEvent::Deleted(object)
            }
            WireEvent::Synced => ResourceEvent::Synced,
        };
        if tx.send(event).await.is_err() {
            debug!("watcher gone, stop reading");
            break;
        }
    }
    Ok(())
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint =
        signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(format!("failed to install SIGINT handler: {e}")))?;
    let mut sigterm =
        signal(SignalKind::terminate()).map_err(|e| Error::Fatal(format!("failed to install SIGTERM handler: {e}")))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }
    info!("Shutdown requested");
    Ok(())
}

pub fn init_observability(log: &LogConfig) -> Result<WorkerGuard> {
    let (non_blocking, guard) = match &log.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)
                .map_err(|e| Error::Fatal(format!("failed to create log dir {}: {e}", log_dir.display())))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, "watch-index.log"))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
