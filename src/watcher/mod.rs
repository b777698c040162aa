//! Event-driven coordination of indexer, store and debouncer.
//!
//! [`Watcher`] consumes an [`EventSource`] and keeps a [`crate::Store`] in step
//! with it. [`SingleWatcher`] forwards every post-sync event of a single
//! resource straight to its callback.

mod builder;
mod bulk;
mod lifecycle;
mod single;
mod source;
mod state;

pub use builder::*;
pub use bulk::*;
pub(crate) use lifecycle::*;
pub use single::*;
pub use source::*;
pub use state::*;

#[cfg(test)]
mod bulk_test;
