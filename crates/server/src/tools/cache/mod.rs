//! Cache-related MCP tools.
//!
//! This module provides read-only views of the SQLite cache stores.

pub mod entries;
pub mod stores;

pub use entries::{CacheEntriesParams, entries_impl};
pub use stores::stores_impl;
