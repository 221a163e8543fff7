//! Network capability.

use async_trait::async_trait;

use crate::Error;
use crate::request::{InterceptedRequest, ResponseSnapshot};

/// Performs a live fetch for an intercepted request.
///
/// Any HTTP response, whatever its status, is a successful fetch. An `Err`
/// means no response was obtained (offline, timeout, connection reset).
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error>;
}
