//! Shared fixtures for unit tests.
mod common;

pub use common::*;
