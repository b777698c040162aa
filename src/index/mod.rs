//! Resource indexing: field stripping and composite key extraction.

mod extractor;
mod filter;
mod indexer;

pub use extractor::*;
pub use filter::*;
pub use indexer::*;
