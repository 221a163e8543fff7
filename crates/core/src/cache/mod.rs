//! SQLite-backed cache stores for response snapshots.
//!
//! This module provides named, persistent cache generations using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - One store per version tag, deleted as a whole
//! - Request identity keys derived with SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::EntrySummary;
pub use key::compute_request_key;
pub use storage::{CacheStorage, StoreHandle};
