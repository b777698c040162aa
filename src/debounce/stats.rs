use std::fmt;

/// Kind of change applied to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let kind = match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        };
        f.write_str(kind)
    }
}

/// Changes aggregated over one debounce window.
///
/// `is_initial_sync` marks batches delivered before the source finished its
/// initial listing; it never counts as a change by itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
    pub is_initial_sync: bool,
}

impl ChangeStats {
    pub fn total(&self) -> usize {
        self.created + self.modified + self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub(crate) fn record(
        &mut self,
        kind: ChangeKind,
    ) {
        match kind {
            ChangeKind::Created => self.created += 1,
            ChangeKind::Modified => self.modified += 1,
            ChangeKind::Deleted => self.deleted += 1,
        }
    }
}
