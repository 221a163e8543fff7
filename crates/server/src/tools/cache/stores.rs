//! cache_stores tool implementation.
//!
//! Lists every existing cache store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::CacheDb;

use crate::tools::json_result;

/// One cache store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub entries: u64,
    /// Whether this is the store named by the current version tag.
    pub current: bool,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    pub stores: Vec<StoreInfo>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(cache: &CacheDb, current: &str) -> Result<CallToolResult, McpError> {
    let mut stores = Vec::new();
    for name in cache.store_names().await? {
        let entries = cache.count_entries(&name).await?;
        stores.push(StoreInfo { current: name == current, name, entries });
    }

    json_result(&CacheStoresOutput { stores })
}
