//! Store and entry CRUD operations.
//!
//! A store is a named cache generation; entries are response snapshots keyed
//! by request identity inside one store. Deleting a store cascades to its
//! entries.

use super::connection::CacheDb;
use super::key::compute_request_key;
use crate::Error;
use crate::request::{InterceptedRequest, ResponseSnapshot};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Listing row for a cached entry (body omitted).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

impl CacheDb {
    /// Create a store if it does not exist yet.
    pub async fn create_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all existing stores, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no store had that name.
    pub async fn drop_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the entry for `request` in `store`.
    ///
    /// Creates the store when missing. The store row and the entry are
    /// written in one transaction, so an abandoned write leaves nothing.
    pub async fn put_entry(
        &self, store: &str, request: &InterceptedRequest, response: &ResponseSnapshot,
    ) -> Result<(), Error> {
        let store = store.to_string();
        let key = compute_request_key(request.method(), request.url());
        let method = request.method().to_string();
        let url = request.url().to_string();
        let status = response.status;
        let headers_json = serde_json::to_string(&response.headers)?;
        let body = response.body.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (store, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![store, key, method, url, status, headers_json, body, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for `request` in `store`.
    pub async fn get_entry(&self, store: &str, request: &InterceptedRequest) -> Result<Option<ResponseSnapshot>, Error> {
        let store = store.to_string();
        let key = compute_request_key(request.method(), request.url());
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>)>, Error> {
                let mut stmt = conn
                    .prepare("SELECT status, headers_json, body FROM cache_entries WHERE store = ?1 AND key_hash = ?2")?;

                let result = stmt.query_row(params![store, key], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)));

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match row {
            Some((status, headers_json, body)) => {
                let headers = serde_json::from_str(&headers_json)?;
                Ok(Some(ResponseSnapshot { status, headers, body }))
            }
            None => Ok(None),
        }
    }

    /// Number of entries in a store (0 if it does not exist).
    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Summaries of every entry in a store, ordered by URL.
    pub async fn list_entries(&self, store: &str) -> Result<Vec<EntrySummary>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, stored_at FROM cache_entries
                     WHERE store = ?1 ORDER BY url ASC, method ASC",
                )?;
                let entries = stmt
                    .query_map(params![store], |row| {
                        Ok(EntrySummary {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            stored_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(url).unwrap())
    }

    fn css(body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(
            200,
            vec![("content-type".into(), "text/css".into()), ("etag".into(), "\"abc\"".into())],
            body,
        )
    }

    #[tokio::test]
    async fn test_put_and_get_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://example.com/styles.css");
        let response = ResponseSnapshot::new(
            404,
            vec![("X-B".into(), "2".into()), ("x-a".into(), "1".into())],
            vec![0u8, 159, 146, 150],
        );

        db.put_entry("churchhub-v1", &request, &response).await.unwrap();

        let stored = db.get_entry("churchhub-v1", &request).await.unwrap().unwrap();
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("churchhub-v1", &get("https://example.com/")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://example.com/styles.css");

        db.put_entry("churchhub-v1", &request, &css("old{}")).await.unwrap();
        db.put_entry("churchhub-v1", &request, &css("new{}")).await.unwrap();

        let stored = db.get_entry("churchhub-v1", &request).await.unwrap().unwrap();
        assert_eq!(stored.body, b"new{}");
        assert_eq!(db.count_entries("churchhub-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://example.com/app.js");
        db.put_entry("churchhub-v0", &request, &css("v0")).await.unwrap();

        assert!(db.get_entry("churchhub-v1", &request).await.unwrap().is_none());
        assert!(db.get_entry("churchhub-v0", &request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("churchhub-v0", &get("https://example.com/a.css"), &css("a"))
            .await
            .unwrap();
        db.create_store("churchhub-v1").await.unwrap();

        assert!(db.drop_store("churchhub-v0").await.unwrap());
        assert!(!db.drop_store("churchhub-v0").await.unwrap());
        assert_eq!(db.store_names().await.unwrap(), vec!["churchhub-v1".to_string()]);
        assert_eq!(db.count_entries("churchhub-v0").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_store_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_store("churchhub-v1").await.unwrap();
        db.create_store("churchhub-v1").await.unwrap();
        assert_eq!(db.store_names().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("churchhub-v1", &get("https://example.com/b.js"), &css("b"))
            .await
            .unwrap();
        db.put_entry("churchhub-v1", &get("https://example.com/a.css"), &css("a"))
            .await
            .unwrap();

        let entries = db.list_entries("churchhub-v1").await.unwrap();
        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a.css", "https://example.com/b.js"]);
        assert!(entries.iter().all(|e| e.method == "GET" && e.status == 200));
    }
}
