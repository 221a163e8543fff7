//! cache_entries tool implementation.
//!
//! Lists the entries of one store (the current one by default).

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, cache::EntrySummary};

use crate::tools::json_result;

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Store to list; defaults to the current version's store.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub store: String,
    pub entries: Vec<EntrySummary>,
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(
    cache: &CacheDb, current: &str, params: CacheEntriesParams,
) -> Result<CallToolResult, McpError> {
    let store = params.store.unwrap_or_else(|| current.to_string());
    let entries = cache.list_entries(&store).await?;

    json_result(&CacheEntriesOutput { store, entries })
}
