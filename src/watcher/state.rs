use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

/// Initial-sync state of a watcher. `Synced` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    NotStarted = 0,
    Syncing = 1,
    Synced = 2,
}

impl From<u8> for SyncState {
    fn from(value: u8) -> Self {
        match value {
            0 => SyncState::NotStarted,
            1 => SyncState::Syncing,
            _ => SyncState::Synced,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SyncCell(AtomicU8);

impl SyncCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(SyncState::NotStarted as u8))
    }

    pub(crate) fn get(&self) -> SyncState {
        self.0.load(Ordering::Acquire).into()
    }

    /// `NotStarted -> Syncing`. No effect in any other state.
    pub(crate) fn begin(&self) -> bool {
        self.0
            .compare_exchange(
                SyncState::NotStarted as u8,
                SyncState::Syncing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves to `Synced`. Returns true only for the call that made the
    /// transition.
    pub(crate) fn complete(&self) -> bool {
        self.0.swap(SyncState::Synced as u8, Ordering::AcqRel) != SyncState::Synced as u8
    }
}
