use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::ensure_full_key;
use super::ensure_lookup_key;
use super::IndexKey;
use super::ResourceFetcher;
use super::Slots;
use super::Store;
use crate::utils::async_task::fetch_with_timeout;
use crate::FieldFilter;
use crate::Resource;
use crate::ResourceId;
use crate::ResourceType;
use crate::Result;
use crate::StoreError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(130);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Enough to re-fetch a resource, nothing more.
#[derive(Debug, Clone)]
struct ResourceRef {
    id: ResourceId,
    key: IndexKey,
}

struct CacheEntry<R> {
    payload: Arc<R>,
    expires_at: Instant,
}

/// Reference-based store with an on-demand body cache.
///
/// Slots hold only `(identity, key)` pairs. Bodies are cached by identity
/// with a TTL that every successful read pushes forward. Cache misses are
/// fetched outside any lock; two concurrent misses for the same identity may
/// both fetch, the later write wins.
pub struct CachedStore<R: Resource> {
    num_keys: usize,
    resource_type: ResourceType,
    fetcher: Arc<dyn ResourceFetcher<R>>,
    filter: FieldFilter,
    ttl: Duration,
    fetch_timeout: Duration,
    refs: RwLock<Slots<ResourceRef>>,
    cache: DashMap<String, CacheEntry<R>>,
}

impl<R: Resource> CachedStore<R> {
    pub fn new(
        num_keys: usize,
        resource_type: ResourceType,
        fetcher: Arc<dyn ResourceFetcher<R>>,
    ) -> Self {
        Self {
            num_keys,
            resource_type,
            fetcher,
            filter: FieldFilter::default(),
            ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            refs: RwLock::new(Slots::default()),
            cache: DashMap::new(),
        }
    }

    pub fn with_ttl(
        mut self,
        ttl: Duration,
    ) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(
        mut self,
        fetch_timeout: Duration,
    ) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Filter applied to fetched bodies before they are cached.
    pub fn with_filter(
        mut self,
        filter: FieldFilter,
    ) -> Self {
        self.filter = filter;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Records a reference without a body; the first read fetches it.
    pub fn track(
        &self,
        id: ResourceId,
        key: IndexKey,
    ) -> Result<()> {
        ensure_full_key(self.num_keys, &key)?;
        self.insert_ref(id, key);
        Ok(())
    }

    /// Number of cached bodies, expired or not.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn insert_ref(
        &self,
        id: ResourceId,
        key: IndexKey,
    ) {
        let reference = ResourceRef {
            id: id.clone(),
            key: key.clone(),
        };
        self.refs.write().upsert(key, reference, |existing| existing.id.same_as(&id));
    }

    fn upsert(
        &self,
        resource: R,
        key: IndexKey,
    ) -> Result<()> {
        ensure_full_key(self.num_keys, &key)?;
        let id = resource.id();
        self.cache.insert(
            id.cache_key(),
            CacheEntry {
                payload: Arc::new(resource),
                expires_at: Instant::now() + self.ttl,
            },
        );
        trace!(resource = %id, %key, "cached store upsert");
        self.insert_ref(id, key);
        Ok(())
    }

    /// Fresh cache hit, with its expiry pushed forward.
    fn cached(
        &self,
        cache_key: &str,
    ) -> Option<Arc<R>> {
        let mut entry = self.cache.get_mut(cache_key)?;
        let now = Instant::now();
        if entry.expires_at <= now {
            return None;
        }
        entry.expires_at = now + self.ttl;
        Some(entry.payload.clone())
    }

    async fn load(
        &self,
        reference: &ResourceRef,
    ) -> std::result::Result<Arc<R>, StoreError> {
        let cache_key = reference.id.cache_key();
        if let Some(payload) = self.cached(&cache_key) {
            return Ok(payload);
        }

        debug!(resource = %reference.id, key = %reference.key, "cache miss, fetching");
        let mut resource = fetch_with_timeout(
            self.fetch_timeout,
            self.fetcher.fetch(&self.resource_type, &reference.id),
        )
        .await
        .map_err(|source| StoreError::Fetch {
            resource: cache_key.clone(),
            source,
        })?;

        self.filter
            .apply(&mut resource)
            .map_err(|source| StoreError::PostFetchFilter {
                resource: cache_key.clone(),
                source,
            })?;

        let payload = Arc::new(resource);
        self.cache.insert(
            cache_key,
            CacheEntry {
                payload: payload.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(payload)
    }

    /// Loads every reference concurrently. Failed loads are skipped.
    async fn load_all(
        &self,
        references: Vec<ResourceRef>,
    ) -> Vec<Arc<R>> {
        let results = join_all(references.iter().map(|reference| self.load(reference))).await;
        results
            .into_iter()
            .zip(references.iter())
            .filter_map(|(result, reference)| match result {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(resource = %reference.id, key = %reference.key, error = %e, "skipping unresolvable resource");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl<R: Resource> Store<R> for CachedStore<R> {
    fn num_keys(&self) -> usize {
        self.num_keys
    }

    fn add(
        &self,
        resource: R,
        key: IndexKey,
    ) -> Result<()> {
        self.upsert(resource, key)
    }

    fn update(
        &self,
        resource: R,
        key: IndexKey,
    ) -> Result<()> {
        self.upsert(resource, key)
    }

    /// The cached body is kept so a re-keyed resource needs no fetch.
    fn remove(
        &self,
        id: &ResourceId,
        key: &IndexKey,
    ) -> Result<bool> {
        ensure_full_key(self.num_keys, key)?;
        let removed = self.refs.write().remove_one(key, |existing| existing.id.same_as(id));
        Ok(removed.is_some())
    }

    fn delete(
        &self,
        key: &IndexKey,
    ) -> Result<usize> {
        ensure_full_key(self.num_keys, key)?;
        let removed = self.refs.write().remove_slot(key);
        for reference in &removed {
            self.cache.remove(&reference.id.cache_key());
        }
        if !removed.is_empty() {
            debug!(%key, removed = removed.len(), "cached store slot deleted");
        }
        Ok(removed.len())
    }

    async fn get(
        &self,
        key: &IndexKey,
    ) -> Result<Vec<Arc<R>>> {
        ensure_lookup_key(self.num_keys, key)?;
        let exact = key.len() == self.num_keys;
        let references: Vec<ResourceRef> = {
            let refs = self.refs.read();
            refs.resolve(key, exact).into_iter().cloned().collect()
        };
        Ok(self.load_all(references).await)
    }

    /// One fetch per uncached reference. Not meant for hot paths.
    async fn list(&self) -> Result<Arc<[Arc<R>]>> {
        let references: Vec<ResourceRef> = self.refs.read().values().cloned().collect();
        Ok(self.load_all(references).await.into())
    }

    fn len(&self) -> usize {
        self.refs.read().len()
    }

    fn clear(&self) {
        self.refs.write().clear();
        self.cache.clear();
    }

    fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.cache.retain(|_, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            debug!(evicted, "evicted expired cache entries");
        }
        evicted
    }
}
