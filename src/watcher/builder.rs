//! Builder for [`Watcher`].
//!
//! Assembles the indexer, the store selected by `store_type` and the
//! debouncer from a [`WatcherConfig`], plus the consumer callbacks.
//! `build` must run inside a tokio runtime; the handlers may then be called
//! from any thread.
//!
//! ## Example
//! ```ignore
//! let watcher = WatcherBuilder::<DynamicObject>::new(config)
//!     .on_change(|store, stats| info!(?stats, size = store.len(), "changed"))
//!     .on_sync_complete(|_, initial| info!(initial, "synced"))
//!     .fetcher(Arc::new(client))   // required for `store_type = "cached"`
//!     .build()?;
//! let (tx, rx) = event_channel(config.event_queue_size);
//! watcher.start(rx).await?;
//! ```

use std::sync::Arc;

use tracing::debug;

use super::Lifecycle;
use super::OnSyncComplete;
use super::SyncCell;
use super::Watcher;
use crate::CachedStore;
use crate::ChangeStats;
use crate::Debouncer;
use crate::Error;
use crate::Indexer;
use crate::MemoryStore;
use crate::OnChange;
use crate::Resource;
use crate::ResourceFetcher;
use crate::Result;
use crate::Store;
use crate::StoreType;
use crate::WatcherConfig;

pub struct WatcherBuilder<R: Resource> {
    config: WatcherConfig,
    on_change: Option<OnChange<R>>,
    on_sync_complete: Option<OnSyncComplete<R>>,
    fetcher: Option<Arc<dyn ResourceFetcher<R>>>,
}

impl<R: Resource> WatcherBuilder<R> {
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            on_change: None,
            on_sync_complete: None,
            fetcher: None,
        }
    }

    /// Debounced change callback.
    pub fn on_change<F>(
        mut self,
        on_change: F,
    ) -> Self
    where
        F: Fn(Arc<dyn Store<R>>, ChangeStats) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(on_change));
        self
    }

    pub fn on_sync_complete<F>(
        mut self,
        on_sync_complete: F,
    ) -> Self
    where
        F: Fn(Arc<dyn Store<R>>, usize) + Send + Sync + 'static,
    {
        self.on_sync_complete = Some(Arc::new(on_sync_complete));
        self
    }

    /// Fetch client for the cached store. Ignored by the memory store.
    pub fn fetcher(
        mut self,
        fetcher: Arc<dyn ResourceFetcher<R>>,
    ) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn build(self) -> Result<Watcher<R>> {
        let config = self.config;
        config.validate()?;

        let indexer = Indexer::new(&config.index_by, &config.ignore_fields)?;
        let store: Arc<dyn Store<R>> = match config.store_type {
            StoreType::Memory => Arc::new(MemoryStore::new(indexer.num_keys())),
            StoreType::Cached => {
                let fetcher = self
                    .fetcher
                    .ok_or_else(|| Error::InvalidConfig("cached store requires a resource fetcher".into()))?;
                Arc::new(
                    CachedStore::new(indexer.num_keys(), config.resource.clone(), fetcher)
                        .with_ttl(config.cache_ttl())
                        .with_fetch_timeout(config.fetch_timeout())
                        .with_filter(indexer.filter().clone()),
                )
            }
        };

        let on_change: OnChange<R> = self
            .on_change
            .unwrap_or_else(|| Arc::new(|_: Arc<dyn Store<R>>, _: ChangeStats| {}));
        let debouncer = Debouncer::new(
            config.debounce_interval(),
            on_change,
            store.clone(),
            !config.call_on_change_during_sync,
        )?;
        debug!(?config, num_keys = indexer.num_keys(), "watcher built");

        Ok(Watcher {
            config,
            indexer,
            store,
            debouncer,
            on_sync_complete: self.on_sync_complete,
            sync: SyncCell::new(),
            lifecycle: Lifecycle::new(),
        })
    }
}
