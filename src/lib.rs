//! Indexed resource store with debounced change notification.
//!
//! A [`Watcher`] consumes add/update/delete events from an external source,
//! strips ignored fields, extracts a composite [`IndexKey`] and keeps a
//! [`Store`] current. Consumers are told about changes through a debounced
//! callback and about the end of the initial listing exactly once.

mod config;
mod debounce;
mod errors;
mod index;
mod path;
mod resource;
mod store;
mod watcher;
pub(crate) mod utils;

pub use self::config::*;
pub use debounce::*;
pub use errors::*;
pub use index::*;
pub use path::*;
pub use resource::*;
pub use store::*;
pub use watcher::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
