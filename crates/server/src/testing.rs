//! Test doubles for tool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shellcache_core::{CacheDb, Error, InterceptedRequest, Network, OfflineWorker, ResponseSnapshot, ShellConfig};
use url::Url;

/// Answers every request with the same body, or fails every request.
pub(crate) struct StaticNetwork {
    body: Option<&'static str>,
    calls: AtomicUsize,
}

impl StaticNetwork {
    pub(crate) fn serving(body: &'static str) -> Arc<Self> {
        Arc::new(Self { body: Some(body), calls: AtomicUsize::new(0) })
    }

    pub(crate) fn offline() -> Arc<Self> {
        Arc::new(Self { body: None, calls: AtomicUsize::new(0) })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, _request: &InterceptedRequest) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.body {
            Some(body) => Ok(ResponseSnapshot::new(200, vec![("content-type".into(), "text/plain".into())], body)),
            None => Err(Error::Network("offline".into())),
        }
    }
}

/// A worker over an in-memory store precaching `/` and `/index.html`.
pub(crate) async fn worker(network: Arc<StaticNetwork>) -> (OfflineWorker, CacheDb) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let config = ShellConfig::new(
        "churchhub-v1",
        Url::parse("https://church.example").unwrap(),
        vec!["/".into(), "/index.html".into()],
    );
    (OfflineWorker::new(config, Arc::new(db.clone()), network), db)
}
