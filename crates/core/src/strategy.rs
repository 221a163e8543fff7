//! Cache-first and network-first fetch strategies.
//!
//! Every response obtained from the network is written back to the current
//! store before it is returned, so the cache stays warm without a separate
//! refresh process. Store failures never fail a request that already has a
//! live response.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::{CacheStorage, StoreHandle};
use crate::classify::Strategy;
use crate::config::ShellConfig;
use crate::network::Network;
use crate::request::{InterceptedRequest, ResponseSnapshot};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Live network response (and now also stored).
    Network,
    /// Snapshot read from the current store.
    Cache,
    /// Synthesized `{"offline":true}` payload.
    OfflineFallback,
}

/// A response handed back to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
}

impl Served {
    fn network(response: ResponseSnapshot) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    fn cache(response: ResponseSnapshot) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    fn offline() -> Self {
        Self { response: ResponseSnapshot::offline_fallback(), source: ResponseSource::OfflineFallback }
    }
}

/// Executes a strategy against the current store and the network.
pub struct StrategyExecutor {
    config: Arc<ShellConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl StrategyExecutor {
    pub fn new(config: Arc<ShellConfig>, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { config, storage, network }
    }

    pub async fn execute(&self, strategy: Strategy, request: &InterceptedRequest) -> Result<Served, Error> {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        }
    }

    /// Serve from the store when possible; otherwise fetch and store.
    ///
    /// A miss combined with a network failure returns the network error;
    /// there is no fallback payload on this path. A store that cannot be
    /// opened is bypassed: the live response is returned without write-back.
    pub async fn cache_first(&self, request: &InterceptedRequest) -> Result<Served, Error> {
        let name = self.config.cache_name.as_str();
        let store = match StoreHandle::open(self.storage.as_ref(), name).await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(store = name, url = %request.url(), error = %e, "could not open store, fetching live");
                return self.network.fetch(request).await.map(Served::network);
            }
        };

        match store.lookup(request).await {
            Ok(Some(hit)) => {
                tracing::debug!(url = %request.url(), "cache-first hit");
                return Ok(Served::cache(hit));
            }
            Ok(None) => tracing::debug!(url = %request.url(), "cache-first miss"),
            Err(e) => tracing::warn!(url = %request.url(), error = %e, "cache lookup failed, treating as miss"),
        }

        let live = self.network.fetch(request).await?;
        remember(&store, request, &live).await;
        Ok(Served::network(live))
    }

    /// Fetch first; on failure fall back to the store, then to the offline
    /// payload. Never returns an error.
    pub async fn network_first(&self, request: &InterceptedRequest) -> Result<Served, Error> {
        let storage = self.storage.as_ref();
        let name = self.config.cache_name.as_str();

        let failure = match self.network.fetch(request).await {
            Ok(live) => {
                match StoreHandle::open(storage, name).await {
                    Ok(store) => remember(&store, request, &live).await,
                    Err(e) => tracing::warn!(store = name, error = %e, "could not open store"),
                }
                return Ok(Served::network(live));
            }
            Err(e) => e,
        };

        if failure.is_network_failure() {
            tracing::debug!(url = %request.url(), error = %failure, "network-first fetch failed, trying cache");
        } else {
            tracing::warn!(url = %request.url(), error = %failure, "network-first fetch rejected, trying cache");
        }

        let lookup = match StoreHandle::open(storage, name).await {
            Ok(store) => store.lookup(request).await,
            Err(e) => Err(e),
        };

        match lookup {
            Ok(Some(hit)) => Ok(Served::cache(hit)),
            Ok(None) => Ok(Served::offline()),
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "cache lookup failed after network failure");
                Ok(Served::offline())
            }
        }
    }
}

/// Store a copy of a live response, logging instead of failing.
async fn remember(store: &StoreHandle<'_>, request: &InterceptedRequest, live: &ResponseSnapshot) {
    match store.put(request, live).await {
        Ok(()) => {
            tracing::debug!(store = store.name(), url = %request.url(), status = live.status, "cached network response")
        }
        Err(e) => {
            tracing::warn!(store = store.name(), url = %request.url(), error = %e, "failed to cache network response")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use crate::testing::ScriptedNetwork;
    use async_trait::async_trait;
    use url::Url;

    const ORIGIN: &str = "https://church.example";

    struct Fixture {
        db: CacheDb,
        network: Arc<ScriptedNetwork>,
        executor: StrategyExecutor,
    }

    async fn fixture() -> Fixture {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let config = ShellConfig::new("churchhub-v1", Url::parse(ORIGIN).unwrap(), vec!["/".into()]);
        let executor = StrategyExecutor::new(config, Arc::new(db.clone()), network.clone());
        Fixture { db, network, executor }
    }

    fn get(path: &str) -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_then_serves_from_store() {
        let f = fixture().await;
        f.network.ok("/styles.css", "text/css", "body{}");
        let request = get("/styles.css");

        let first = f.executor.cache_first(&request).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(first.response.body, b"body{}");
        assert_eq!(f.network.calls(), 1);

        let second = f.executor.cache_first(&request).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.body, b"body{}");
        assert_eq!(f.network.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_hit_never_touches_network() {
        let f = fixture().await;
        let request = get("/app.js");
        let stored = ResponseSnapshot::new(200, vec![], "old()");
        f.db.put_entry("churchhub-v1", &request, &stored).await.unwrap();
        f.network.ok("/app.js", "text/javascript", "new()");

        let served = f.executor.cache_first(&request).await.unwrap();
        assert_eq!(served.response, stored);
        assert_eq!(f.network.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_offline_propagates() {
        let f = fixture().await;
        f.network.set_offline(true);

        let result = f.executor.cache_first(&get("/styles.css")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    /// Storage whose stores can never be opened.
    struct UnopenableStorage;

    #[async_trait]
    impl CacheStorage for UnopenableStorage {
        async fn open(&self, _store: &str) -> Result<(), Error> {
            Err(Error::MigrationFailed("disk full".into()))
        }

        async fn get(&self, _store: &str, _request: &InterceptedRequest) -> Result<Option<ResponseSnapshot>, Error> {
            Err(Error::MigrationFailed("disk full".into()))
        }

        async fn put(&self, _store: &str, _request: &InterceptedRequest, _response: &ResponseSnapshot) -> Result<(), Error> {
            Err(Error::MigrationFailed("disk full".into()))
        }

        async fn delete_store(&self, _store: &str) -> Result<bool, Error> {
            Err(Error::MigrationFailed("disk full".into()))
        }

        async fn list_stores(&self) -> Result<Vec<String>, Error> {
            Err(Error::MigrationFailed("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_cache_first_unopenable_store_serves_live() {
        let network = Arc::new(ScriptedNetwork::new());
        network.ok("/styles.css", "text/css", "body{}");
        let config = ShellConfig::new("churchhub-v1", Url::parse(ORIGIN).unwrap(), vec!["/".into()]);
        let executor = StrategyExecutor::new(config, Arc::new(UnopenableStorage), network.clone());

        let served = executor.cache_first(&get("/styles.css")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body, b"body{}");
        assert_eq!(network.calls(), 1);

        network.set_offline(true);
        let result = executor.cache_first(&get("/styles.css")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_network_first_offline_without_entry_returns_fallback() {
        let f = fixture().await;
        f.network.set_offline(true);

        let served = f.executor.network_first(&get("/api/prayers")).await.unwrap();
        assert_eq!(served.source, ResponseSource::OfflineFallback);
        assert_eq!(served.response.content_type(), Some("application/json"));
        let json: serde_json::Value = serde_json::from_slice(&served.response.body).unwrap();
        assert_eq!(json["offline"], true);
    }

    #[tokio::test]
    async fn test_network_first_offline_serves_prior_entry() {
        let f = fixture().await;
        let request = get("/api/prayers");
        f.network.ok("/api/prayers", "application/json", r#"[{"id":1}]"#);

        let online = f.executor.network_first(&request).await.unwrap();
        assert_eq!(online.source, ResponseSource::Network);

        f.network.set_offline(true);
        let offline = f.executor.network_first(&request).await.unwrap();
        assert_eq!(offline.source, ResponseSource::Cache);
        assert_eq!(offline.response.body, br#"[{"id":1}]"#);
    }

    #[tokio::test]
    async fn test_network_first_overwrites_entry() {
        let f = fixture().await;
        let request = get("/api/public");
        f.db.put_entry("churchhub-v1", &request, &ResponseSnapshot::new(200, vec![], "stale"))
            .await
            .unwrap();
        f.network.ok("/api/public", "application/json", "fresh");

        let served = f.executor.network_first(&request).await.unwrap();
        assert_eq!(served.response.body, b"fresh");

        let stored = f.db.get_entry("churchhub-v1", &request).await.unwrap().unwrap();
        assert_eq!(stored.body, b"fresh");
    }

    #[tokio::test]
    async fn test_non_success_status_is_still_a_response() {
        let f = fixture().await;
        let request = get("/missing.png");
        f.network.respond("/missing.png", ResponseSnapshot::new(404, vec![], "not found"));

        let served = f.executor.network_first(&request).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.status, 404);
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_strategy() {
        let f = fixture().await;
        f.network.set_offline(true);

        let net = f.executor.execute(Strategy::NetworkFirst, &get("/other")).await.unwrap();
        assert_eq!(net.source, ResponseSource::OfflineFallback);

        let cache = f.executor.execute(Strategy::CacheFirst, &get("/other.css")).await;
        assert!(cache.is_err());
    }
}
