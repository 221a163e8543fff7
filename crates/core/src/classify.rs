//! Request classification.
//!
//! Rules, first match wins:
//! 1. non-GET methods pass through untouched
//! 2. precache paths and `.html`/`.css`/`.js` assets are cache-first
//! 3. `/api/` paths are network-first
//! 4. everything else is network-first

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ShellConfig;

/// Suffixes of static assets served cache-first.
const STATIC_SUFFIXES: &[&str] = &[".html", ".css", ".js"];

const API_PREFIX: &str = "/api/";

/// Fetch strategy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

/// Classification result for one request.
///
/// `NetworkFirstApi` and `NetworkFirst` currently behave the same; the API
/// route is kept separate so it can get its own offline payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Passthrough,
    CacheFirst,
    NetworkFirstApi,
    NetworkFirst,
}

impl Route {
    /// The strategy to execute, or `None` for passthrough.
    pub fn strategy(self) -> Option<Strategy> {
        match self {
            Route::Passthrough => None,
            Route::CacheFirst => Some(Strategy::CacheFirst),
            Route::NetworkFirstApi | Route::NetworkFirst => Some(Strategy::NetworkFirst),
        }
    }
}

/// Assigns every request to exactly one route.
#[derive(Debug, Clone)]
pub struct Classifier {
    precache: HashSet<String>,
}

impl Classifier {
    pub fn new<I, S>(precache: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { precache: precache.into_iter().map(Into::into).collect() }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(config.precache.iter().cloned())
    }

    pub fn classify(&self, method: &str, path: &str) -> Route {
        if method != "GET" {
            return Route::Passthrough;
        }
        if self.precache.contains(path) || STATIC_SUFFIXES.iter().any(|s| path.ends_with(s)) {
            return Route::CacheFirst;
        }
        if path.starts_with(API_PREFIX) {
            return Route::NetworkFirstApi;
        }
        Route::NetworkFirst
    }
}
