//! sw_install / sw_activate tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{ActivateReport, EventOutcome, InstallReport, LifecycleEvent, OfflineWorker, Phase};

use super::json_result;
use crate::error::ToolError;

/// Output of a lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleOutput {
    /// Phase after the event was handled.
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<InstallReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated: Option<ActivateReport>,
}

/// Dispatch an install or activate event to the worker.
pub async fn lifecycle_impl(worker: &OfflineWorker, event: LifecycleEvent) -> Result<CallToolResult, McpError> {
    let (installed, activated) = match worker.dispatch(event).await? {
        EventOutcome::Installed(report) => (Some(report), None),
        EventOutcome::Activated(report) => (None, Some(report)),
        EventOutcome::Fetched(_) => {
            return Err(ToolError::InvalidInput("fetch events are handled by sw_fetch".into()).into());
        }
    };

    json_result(&LifecycleOutput { phase: worker.lifecycle().phase(), installed, activated })
}
