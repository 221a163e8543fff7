//! Intercepted requests and response snapshots.
//!
//! ### URL canonicalization
//! - Trim whitespace, require an `http`/`https` scheme
//! - Lowercase host, remove fragments
//! - Preserve query string

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Content type of the offline fallback payload.
pub const OFFLINE_CONTENT_TYPE: &str = "application/json";

/// Body of the offline fallback payload.
pub const OFFLINE_BODY: &[u8] = br#"{"offline":true}"#;

/// Status of the offline fallback payload.
pub const OFFLINE_STATUS: u16 = 503;

/// Canonicalize a URL string into a request identity.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Reject anything that is not `http` or `https`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve an absolute path (e.g. `/index.html`) against the served origin.
pub fn resolve_path(origin: &Url, path: &str) -> Result<Url, Error> {
    if !path.starts_with('/') {
        return Err(Error::InvalidUrl(format!("path must be absolute: {path}")));
    }
    let joined = origin.join(path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    canonicalize(joined.as_str())
}

/// A request intercepted from the served application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    method: String,
    url: Url,
    body: Option<Vec<u8>>,
}

impl InterceptedRequest {
    /// Build a request from a method and a full URL.
    ///
    /// The method is upper-cased; the URL is canonicalized.
    pub fn new(method: &str, url: &str) -> Result<Self, Error> {
        let method = method.trim();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidInput(format!("invalid method: {method:?}")));
        }
        Ok(Self { method: method.to_ascii_uppercase(), url: canonicalize(url)?, body: None })
    }

    /// Shorthand for a GET request on an already canonical URL.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, body: None }
    }

    /// Attach a request body.
    ///
    /// GET requests are keyed by method and URL alone, so a body on a GET
    /// is rejected rather than silently sharing a cache entry.
    pub fn with_body(mut self, body: Vec<u8>) -> Result<Self, Error> {
        if self.is_get() {
            return Err(Error::InvalidInput("GET requests cannot carry a body".into()));
        }
        self.body = Some(body);
        Ok(self)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// A stored or live response: status, headers and body bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    pub status: u16,
    /// Header pairs in the order they were received.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// The `{"offline":true}` payload served when network-first has nothing.
    pub fn offline_fallback() -> Self {
        Self {
            status: OFFLINE_STATUS,
            headers: vec![("content-type".to_string(), OFFLINE_CONTENT_TYPE.to_string())],
            body: OFFLINE_BODY.to_vec(),
        }
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
