//! Scripted network fake shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::Error;
use crate::network::Network;
use crate::request::{InterceptedRequest, ResponseSnapshot};

/// Serves canned responses by path; unknown paths and offline mode fail.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, response: ResponseSnapshot) {
        self.responses.lock().unwrap().insert(path.to_string(), response);
    }

    pub(crate) fn ok(&self, path: &str, content_type: &str, body: &str) {
        self.respond(path, ResponseSnapshot::new(200, vec![("content-type".into(), content_type.into())], body));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        self.responses
            .lock()
            .unwrap()
            .get(request.path())
            .cloned()
            .ok_or_else(|| Error::Network(format!("connection refused: {}", request.url())))
    }
}
