//! Core of shellcache, the offline caching policy engine.
//!
//! This crate provides:
//! - Named cache stores with a SQLite backend
//! - Request classification and the cache-first / network-first strategies
//! - Install/activate lifecycle management for versioned stores
//! - Unified error types and layered configuration

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod network;
pub mod request;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheDb, CacheStorage, StoreHandle};
pub use classify::{Classifier, Route, Strategy};
pub use config::{AppConfig, ConfigError, ShellConfig};
pub use error::Error;
pub use lifecycle::{ActivateReport, InstallReport, LifecycleManager, Phase};
pub use network::Network;
pub use request::{InterceptedRequest, ResponseSnapshot};
pub use strategy::{ResponseSource, Served, StrategyExecutor};
pub use worker::{EventOutcome, FetchOutcome, LifecycleEvent, OfflineWorker};
