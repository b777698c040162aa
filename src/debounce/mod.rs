//! Debounced aggregation of store changes.

mod debouncer;
mod stats;

pub use debouncer::*;
pub use stats::*;
