//! Network access for shellcache.
//!
//! This crate provides the HTTP implementation of the core `Network`
//! capability used by the strategy executor and the lifecycle manager.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
