use std::collections::HashMap;

use crate::IndexKey;

/// Composite key -> items sharing that key.
///
/// `len()` always equals the sum of slot lengths. Empty slots are dropped.
#[derive(Debug)]
pub(crate) struct Slots<T> {
    entries: HashMap<IndexKey, Vec<T>>,
    size: usize,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            size: 0,
        }
    }
}

impl<T> Slots<T> {
    /// Replaces the first item `same` accepts, otherwise appends.
    ///
    /// Returns true if an existing item was replaced.
    pub(crate) fn upsert(
        &mut self,
        key: IndexKey,
        item: T,
        same: impl Fn(&T) -> bool,
    ) -> bool {
        let slot = self.entries.entry(key).or_default();
        match slot.iter_mut().find(|existing| same(existing)) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => {
                slot.push(item);
                self.size += 1;
                false
            }
        }
    }

    /// Removes the first item `same` accepts from one slot.
    pub(crate) fn remove_one(
        &mut self,
        key: &IndexKey,
        same: impl Fn(&T) -> bool,
    ) -> Option<T> {
        let slot = self.entries.get_mut(key)?;
        let position = slot.iter().position(same)?;
        let removed = slot.remove(position);
        if slot.is_empty() {
            self.entries.remove(key);
        }
        self.size -= 1;
        Some(removed)
    }

    /// Removes the whole slot.
    pub(crate) fn remove_slot(
        &mut self,
        key: &IndexKey,
    ) -> Vec<T> {
        let removed = self.entries.remove(key).unwrap_or_default();
        self.size -= removed.len();
        removed
    }

    /// Exact lookup when `exact`, otherwise the union of every slot whose key
    /// starts with `key`.
    pub(crate) fn resolve(
        &self,
        key: &IndexKey,
        exact: bool,
    ) -> Vec<&T> {
        if exact {
            return self.entries.get(key).map(|slot| slot.iter().collect()).unwrap_or_default();
        }
        self.entries
            .iter()
            .filter(|(stored, _)| stored.starts_with(key))
            .flat_map(|(_, slot)| slot.iter())
            .collect()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values().flatten()
    }

    pub(crate) fn num_slots(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }
}
