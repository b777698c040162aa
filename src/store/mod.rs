//! Indexed resource stores.
//!
//! Two interchangeable strategies sit behind [`Store`]:
//! - [`MemoryStore`] keeps every (filtered) resource body in memory.
//! - [`CachedStore`] keeps only identity + key references and fetches
//!   bodies on demand, caching them with an access-refreshed TTL.
//!
//! Resources sharing a composite key live in the same slot. Lookups with the
//! full key count are exact; lookups with fewer keys match every slot whose
//! key starts with the given parts.

mod cached;
mod fetcher;
mod janitor;
mod key;
mod memory;
mod slots;

pub use cached::*;
pub use fetcher::*;
pub use janitor::*;
pub use key::*;
pub use memory::*;
pub(crate) use slots::*;

#[cfg(test)]
mod key_test;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Resource;
use crate::ResourceId;
use crate::Result;
use crate::StoreError;

#[async_trait]
pub trait Store<R: Resource>: Send + Sync + 'static {
    /// Number of key parts every stored resource is indexed by.
    fn num_keys(&self) -> usize;

    /// Inserts the resource, or replaces the entry with the same identity in
    /// the same slot.
    fn add(
        &self,
        resource: R,
        key: IndexKey,
    ) -> Result<()>;

    /// Same matching as `add`; inserts when no entry matches.
    fn update(
        &self,
        resource: R,
        key: IndexKey,
    ) -> Result<()>;

    /// Removes the single entry with this identity from one slot.
    ///
    /// Returns false if it was not there.
    fn remove(
        &self,
        id: &ResourceId,
        key: &IndexKey,
    ) -> Result<bool>;

    /// Removes every resource sharing the full key. Returns how many.
    fn delete(
        &self,
        key: &IndexKey,
    ) -> Result<usize>;

    /// Exact match with a full key, prefix match with fewer parts.
    async fn get(
        &self,
        key: &IndexKey,
    ) -> Result<Vec<Arc<R>>>;

    async fn list(&self) -> Result<Arc<[Arc<R>]>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    /// Drops cached bodies past their expiry. Returns how many were evicted.
    fn evict_expired(&self) -> usize {
        0
    }
}

/// Mutations need the complete key.
pub(crate) fn ensure_full_key(
    num_keys: usize,
    key: &IndexKey,
) -> Result<()> {
    if key.len() != num_keys {
        return Err(StoreError::KeyCount {
            expected: num_keys,
            actual: key.len(),
        }
        .into());
    }
    Ok(())
}

/// Lookups accept a prefix of the key but never more parts than configured.
pub(crate) fn ensure_lookup_key(
    num_keys: usize,
    key: &IndexKey,
) -> Result<()> {
    if key.len() > num_keys {
        return Err(StoreError::TooManyKeys {
            max: num_keys,
            actual: key.len(),
        }
        .into());
    }
    Ok(())
}
