use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use parking_lot::RwLockUpgradableReadGuard;
use tracing::debug;
use tracing::trace;

use super::ensure_full_key;
use super::ensure_lookup_key;
use super::IndexKey;
use super::Slots;
use super::Store;
use crate::Resource;
use crate::ResourceId;
use crate::Result;

struct MemoryState<R> {
    slots: Slots<Arc<R>>,
    /// Flattened view for `list`; `None` when a mutation invalidated it.
    flattened: Option<Arc<[Arc<R>]>>,
}

/// Full in-memory store.
pub struct MemoryStore<R: Resource> {
    num_keys: usize,
    state: RwLock<MemoryState<R>>,
}

impl<R: Resource> MemoryStore<R> {
    pub fn new(num_keys: usize) -> Self {
        Self {
            num_keys,
            state: RwLock::new(MemoryState {
                slots: Slots::default(),
                flattened: None,
            }),
        }
    }

    fn upsert(
        &self,
        resource: R,
        key: IndexKey,
    ) -> Result<()> {
        ensure_full_key(self.num_keys, &key)?;
        let id = resource.id();
        let mut state = self.state.write();
        let replaced = state
            .slots
            .upsert(key, Arc::new(resource), |existing| existing.id().same_as(&id));
        state.flattened = None;
        trace!(resource = %id, replaced, "memory store upsert");
        Ok(())
    }
}

#[async_trait]
impl<R: Resource> Store<R> for MemoryStore<R> {
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

    fn remove(
        &self,
        id: &ResourceId,
        key: &IndexKey,
    ) -> Result<bool> {
        ensure_full_key(self.num_keys, key)?;
        let mut state = self.state.write();
        let removed = state.slots.remove_one(key, |existing| existing.id().same_as(id)).is_some();
        if removed {
            state.flattened = None;
        }
        Ok(removed)
    }

    fn delete(
        &self,
        key: &IndexKey,
    ) -> Result<usize> {
        ensure_full_key(self.num_keys, key)?;
        let mut state = self.state.write();
        let removed = state.slots.remove_slot(key).len();
        if removed > 0 {
            state.flattened = None;
            debug!(%key, removed, "memory store slot deleted");
        }
        Ok(removed)
    }

    async fn get(
        &self,
        key: &IndexKey,
    ) -> Result<Vec<Arc<R>>> {
        ensure_lookup_key(self.num_keys, key)?;
        let state = self.state.read();
        let exact = key.len() == self.num_keys;
        Ok(state.slots.resolve(key, exact).into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Arc<[Arc<R>]>> {
        let state = self.state.upgradable_read();
        if let Some(flattened) = &state.flattened {
            return Ok(flattened.clone());
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        let flattened: Arc<[Arc<R>]> = state.slots.values().cloned().collect();
        state.flattened = Some(flattened.clone());
        trace!(size = flattened.len(), slots = state.slots.num_slots(), "memory store list rebuilt");
        Ok(flattened)
    }

    fn len(&self) -> usize {
        self.state.read().slots.len()
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.slots.clear();
        state.flattened = None;
    }
}
