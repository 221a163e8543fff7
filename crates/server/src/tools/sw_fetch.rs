//! sw_fetch tool implementation.
//!
//! The interception boundary: receives one outgoing request and either
//! answers it or declines it as passthrough.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{FetchOutcome, InterceptedRequest, OfflineWorker, ResponseSource, Route};

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// HTTP method of the outgoing request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Full URL of the outgoing request.
    pub url: String,

    /// Optional UTF-8 request body, forwarded for non-GET requests.
    /// Rejected on GET.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output of the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwFetchOutput {
    /// Not intercepted; perform the request with default network handling.
    Passthrough { method: String, url: String },
    /// Answered by the caching policy.
    Response {
        route: Route,
        source: ResponseSource,
        status: u16,
        headers: Vec<(String, String)>,
        /// Body decoded as UTF-8 (lossy).
        body: String,
        body_bytes: usize,
    },
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &OfflineWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let mut request = InterceptedRequest::new(&params.method, &params.url)?;
    if let Some(body) = params.body {
        request = request.with_body(body.into_bytes())?;
    }

    let output = match worker.handle_fetch(&request).await? {
        FetchOutcome::Passthrough => {
            SwFetchOutput::Passthrough { method: request.method().to_string(), url: request.url().to_string() }
        }
        FetchOutcome::Respond { route, served } => {
            let response = served.response;
            SwFetchOutput::Response {
                route,
                source: served.source,
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
                body_bytes: response.body.len(),
                headers: response.headers,
            }
        }
    };

    json_result(&output)
}
