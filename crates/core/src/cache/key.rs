//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request: method plus canonical URL.
///
/// The URL is expected to be canonical already (no fragment, lowercase host),
/// so the origin is always part of the identity.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
