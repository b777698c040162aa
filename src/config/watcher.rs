use std::fmt::Debug;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Resource type descriptor handed to fetch clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default = "default_namespaced")]
    pub namespaced: bool,
}

impl Default for ResourceType {
    fn default() -> Self {
        Self {
            api_version: String::new(),
            kind: String::new(),
            namespaced: default_namespaced(),
        }
    }
}

fn default_namespaced() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Keep every filtered body in memory
    #[default]
    Memory,
    /// Keep references only, fetch bodies on demand with a TTL cache
    Cached,
}

/// Configuration of one watcher instance.
#[derive(Serialize, Deserialize, Clone)]
pub struct WatcherConfig {
    /// Type of the watched resource
    #[serde(default)]
    pub resource: ResourceType,

    /// Field-path expressions forming the composite index key, in order.
    /// At least one is required.
    #[serde(default)]
    pub index_by: Vec<String>,

    /// Field-path expressions stripped from every resource before storage
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    #[serde(default)]
    pub store_type: StoreType,

    /// Cached body lifetime, pushed forward on every read
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_in_ms: u64,

    /// Bound applied to every fetch of the cached store
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_in_ms: u64,

    #[serde(default = "default_debounce_interval")]
    pub debounce_interval_in_ms: u64,

    /// Deliver debounced change callbacks during the initial sync too
    #[serde(default)]
    pub call_on_change_during_sync: bool,

    /// Period of expired cache eviction. 0 disables the janitor.
    #[serde(default = "default_cache_janitor_interval")]
    pub cache_janitor_interval_in_ms: u64,

    /// Capacity of the bounded event queue between source and watcher
    #[serde(default = "default_event_queue_size")]
    pub event_queue_size: usize,
}

impl Debug for WatcherConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WatcherConfig")
            .field("kind", &self.resource.kind)
            .field("index_by", &self.index_by)
            .field("store_type", &self.store_type)
            .finish()
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            resource: ResourceType::default(),
            index_by: Vec::new(),
            ignore_fields: Vec::new(),
            store_type: StoreType::default(),
            cache_ttl_in_ms: default_cache_ttl(),
            fetch_timeout_in_ms: default_fetch_timeout(),
            debounce_interval_in_ms: default_debounce_interval(),
            call_on_change_during_sync: false,
            cache_janitor_interval_in_ms: default_cache_janitor_interval(),
            event_queue_size: default_event_queue_size(),
        }
    }
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.index_by.is_empty() {
            return Err(Error::InvalidConfig("index_by requires at least one expression".into()));
        }

        if self.debounce_interval_in_ms == 0 {
            return Err(Error::InvalidConfig("debounce_interval_in_ms cannot be 0".into()));
        }

        if self.event_queue_size == 0 {
            return Err(Error::InvalidConfig("event_queue_size must be > 0".into()));
        }

        if self.store_type == StoreType::Cached {
            if self.cache_ttl_in_ms == 0 {
                return Err(Error::InvalidConfig(
                    "cache_ttl_in_ms cannot be 0 for a cached store".into(),
                ));
            }
            if self.fetch_timeout_in_ms == 0 {
                return Err(Error::InvalidConfig(
                    "fetch_timeout_in_ms cannot be 0 for a cached store".into(),
                ));
            }
            if self.resource.kind.is_empty() {
                return Err(Error::InvalidConfig(
                    "resource.kind is required for a cached store".into(),
                ));
            }
            if self.cache_janitor_interval_in_ms == 0 {
                warn!("cache janitor disabled, expired bodies are only replaced on read");
            }
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_in_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_in_ms)
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_in_ms)
    }

    /// `None` when the janitor is disabled.
    pub fn cache_janitor_interval(&self) -> Option<Duration> {
        (self.cache_janitor_interval_in_ms > 0).then(|| Duration::from_millis(self.cache_janitor_interval_in_ms))
    }
}

// in ms
fn default_cache_ttl() -> u64 {
    130_000
}
fn default_fetch_timeout() -> u64 {
    10_000
}
fn default_debounce_interval() -> u64 {
    500
}
fn default_cache_janitor_interval() -> u64 {
    60_000
}
fn default_event_queue_size() -> usize {
    1024
}
