//! Field-path expressions used to locate fields to strip and values to index.

mod field_path;
mod segment;

pub use field_path::*;
pub use segment::*;

#[cfg(test)]
mod field_path_test;
