//! Cache versioning: install populates the current store, activate prunes
//! every other store.
//!
//! Both operations are one-shot. A second call while one is running is
//! rejected with [`Error::LifecycleBusy`], and the phase is restored if the
//! running future fails or is dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{join_all, try_join_all};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::{CacheStorage, StoreHandle};
use crate::config::ShellConfig;
use crate::network::Network;
use crate::request::{InterceptedRequest, resolve_path};

/// Lifecycle phase of the current cache version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Result of a successful install.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub cache_name: String,
    /// Precache paths now present in the store, in manifest order.
    pub precached: Vec<String>,
    /// The new version should take over without waiting for old clients to close.
    pub skip_waiting: bool,
}

/// A stale store that could not be deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeletionFailure {
    pub store: String,
    pub error: String,
}

/// Result of an activation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    pub failed: Vec<DeletionFailure>,
    /// The new version should control already-open clients immediately.
    pub claim_clients: bool,
}

/// Owns install and activate for one cache version.
pub struct LifecycleManager {
    config: Arc<ShellConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    phase: Mutex<Phase>,
}

impl LifecycleManager {
    pub fn new(config: Arc<ShellConfig>, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { config, storage, network, phase: Mutex::new(Phase::Idle) }
    }

    pub fn phase(&self) -> Phase {
        *lock(&self.phase)
    }

    /// Open the current store and populate it with the whole precache set.
    ///
    /// Every entry is fetched before any is written; one failed fetch or one
    /// non-2xx response fails the install and writes nothing. Re-running
    /// install overwrites existing entries.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let transition = self.begin(Phase::Installing)?;
        let name = self.config.cache_name.as_str();
        tracing::info!(cache = name, entries = self.config.precache.len(), "installing");

        let store = StoreHandle::open(self.storage.as_ref(), name).await?;

        let mut requests = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            requests.push((path.as_str(), InterceptedRequest::get(resolve_path(&self.config.origin, path)?)));
        }

        let fetched = try_join_all(requests.iter().map(|(path, request)| async move {
            let response = self
                .network
                .fetch(request)
                .await
                .map_err(|e| Error::PrecacheFailed { path: path.to_string(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(Error::PrecacheFailed {
                    path: path.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            Ok::<_, Error>((*path, request, response))
        }))
        .await
        .inspect_err(|e| tracing::warn!(cache = name, error = %e, "install failed"))?;

        let mut precached = Vec::with_capacity(fetched.len());
        for (path, request, response) in fetched {
            store
                .put(request, &response)
                .await
                .map_err(|e| Error::PrecacheFailed { path: path.to_string(), reason: e.to_string() })?;
            precached.push(path.to_string());
        }

        transition.finish(Phase::Installed);
        tracing::info!(cache = name, "installed");

        Ok(InstallReport { cache_name: name.to_string(), precached, skip_waiting: true })
    }

    /// Delete every store other than the current one.
    ///
    /// Deletions run independently; a failed deletion is logged and reported
    /// but does not fail activation. Returns once every deletion has settled.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let transition = self.begin(Phase::Activating)?;
        let name = self.config.cache_name.as_str();

        let stale: Vec<String> = self
            .storage
            .list_stores()
            .await?
            .into_iter()
            .filter(|store| store != name)
            .collect();

        let results = join_all(stale.iter().map(|store| async move {
            let result = self.storage.delete_store(store).await;
            (store, result)
        }))
        .await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (store, result) in results {
            match result {
                Ok(_) => {
                    tracing::info!(store = %store, "deleted stale cache");
                    deleted.push(store.clone());
                }
                Err(e) => {
                    tracing::warn!(store = %store, error = %e, "failed to delete stale cache");
                    failed.push(DeletionFailure { store: store.clone(), error: e.to_string() });
                }
            }
        }

        transition.finish(Phase::Activated);
        tracing::info!(cache = name, deleted = deleted.len(), failed = failed.len(), "activated");

        Ok(ActivateReport { cache_name: name.to_string(), deleted, failed, claim_clients: true })
    }

    fn begin(&self, next: Phase) -> Result<Transition<'_>, Error> {
        let mut phase = lock(&self.phase);
        match (*phase, next) {
            (Phase::Installing, _) => return Err(Error::LifecycleBusy("install")),
            (Phase::Activating, _) => return Err(Error::LifecycleBusy("activate")),
            (Phase::Idle, Phase::Activating) => return Err(Error::NotInstalled),
            _ => {}
        }
        let restore = *phase;
        *phase = next;
        Ok(Transition { phase: &self.phase, restore, finished: false })
    }
}

/// Restores the previous phase unless explicitly finished.
struct Transition<'a> {
    phase: &'a Mutex<Phase>,
    restore: Phase,
    finished: bool,
}

impl Transition<'_> {
    fn finish(mut self, next: Phase) {
        *lock(self.phase) = next;
        self.finished = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *lock(self.phase) = self.restore;
        }
    }
}

fn lock(phase: &Mutex<Phase>) -> MutexGuard<'_, Phase> {
    phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
