//! Event dispatch for the interception layer.
//!
//! The hosting runtime delivers three kinds of events: install, activate and
//! one fetch per outgoing request. [`OfflineWorker::dispatch`] routes each to
//! its handler.

use std::sync::Arc;

use crate::Error;
use crate::cache::CacheStorage;
use crate::classify::{Classifier, Route};
use crate::config::ShellConfig;
use crate::lifecycle::{ActivateReport, InstallReport, LifecycleManager};
use crate::network::Network;
use crate::request::InterceptedRequest;
use crate::strategy::{Served, StrategyExecutor};

/// An event delivered by the hosting runtime.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(InterceptedRequest),
}

/// Outcome of handling one fetch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs its default network handling.
    Passthrough,
    /// Intercepted and answered.
    Respond { route: Route, served: Served },
}

/// Outcome of handling one event.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
}

/// Wires the classifier, strategy executor and lifecycle manager together.
pub struct OfflineWorker {
    config: Arc<ShellConfig>,
    classifier: Classifier,
    executor: StrategyExecutor,
    lifecycle: LifecycleManager,
}

impl OfflineWorker {
    pub fn new(config: Arc<ShellConfig>, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            classifier: Classifier::from_config(&config),
            executor: StrategyExecutor::new(config.clone(), storage.clone(), network.clone()),
            lifecycle: LifecycleManager::new(config.clone(), storage, network),
            config,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn classify(&self, request: &InterceptedRequest) -> Route {
        self.classifier.classify(request.method(), request.path())
    }

    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<EventOutcome, Error> {
        match event {
            LifecycleEvent::Install => self.lifecycle.install().await.map(EventOutcome::Installed),
            LifecycleEvent::Activate => self.lifecycle.activate().await.map(EventOutcome::Activated),
            LifecycleEvent::Fetch(request) => self.handle_fetch(&request).await.map(EventOutcome::Fetched),
        }
    }

    /// Classify a request and run its strategy, or decline it.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let route = self.classify(request);
        let Some(strategy) = route.strategy() else {
            tracing::trace!(method = request.method(), url = %request.url(), "passthrough");
            return Ok(FetchOutcome::Passthrough);
        };

        let served = self.executor.execute(strategy, request).await?;
        tracing::debug!(
            url = %request.url(),
            route = ?route,
            source = ?served.source,
            status = served.response.status,
            "served"
        );
        Ok(FetchOutcome::Respond { route, served })
    }
}
