//! Storage capability used by the lifecycle manager and strategy executor.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;
use crate::request::{InterceptedRequest, ResponseSnapshot};

/// Named persistent key-value stores mapping requests to response snapshots.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if absent.
    async fn open(&self, store: &str) -> Result<(), Error>;

    async fn get(&self, store: &str, request: &InterceptedRequest) -> Result<Option<ResponseSnapshot>, Error>;

    /// Insert or overwrite a single entry atomically.
    async fn put(&self, store: &str, request: &InterceptedRequest, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Delete a whole store. Returns false if it did not exist.
    async fn delete_store(&self, store: &str) -> Result<bool, Error>;

    async fn list_stores(&self) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, store: &str) -> Result<(), Error> {
        self.create_store(store).await
    }

    async fn get(&self, store: &str, request: &InterceptedRequest) -> Result<Option<ResponseSnapshot>, Error> {
        self.get_entry(store, request).await
    }

    async fn put(&self, store: &str, request: &InterceptedRequest, response: &ResponseSnapshot) -> Result<(), Error> {
        self.put_entry(store, request, response).await
    }

    async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        self.drop_store(store).await
    }

    async fn list_stores(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }
}

/// An opened store, borrowed for the duration of one operation.
#[derive(Clone, Copy)]
pub struct StoreHandle<'a> {
    storage: &'a dyn CacheStorage,
    name: &'a str,
}

impl<'a> StoreHandle<'a> {
    /// Open (creating if absent) the named store.
    pub async fn open(storage: &'a dyn CacheStorage, name: &'a str) -> Result<Self, Error> {
        storage.open(name).await?;
        Ok(Self { storage, name })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub async fn lookup(&self, request: &InterceptedRequest) -> Result<Option<ResponseSnapshot>, Error> {
        self.storage.get(self.name, request).await
    }

    pub async fn put(&self, request: &InterceptedRequest, response: &ResponseSnapshot) -> Result<(), Error> {
        self.storage.put(self.name, request, response).await
    }
}
