//! Entry operations on one cache generation.
//!
//! Provides match, put and the all-or-nothing `add_all` used to
//! populate a generation from the manifest.

use std::collections::HashSet;

use bytes::Bytes;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};
use crate::network::Network;

/// Metadata of a stored entry, without its body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredEntry {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    pub stored_at: String,
}

/// Handle to a named generation.
///
/// Handles are cheap to clone. A handle whose generation has been deleted
/// matches nothing and fails on `put`.
#[derive(Clone, Debug)]
pub struct Cache {
    db: CacheDb,
    name: String,
}

/// Row values ready for insertion.
struct EntryRow {
    key: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("only GET requests can be cached, got {}", request.method)));
        }

        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("failed to encode headers: {e}")))?;

        Ok(Self {
            key: request_key(&request.method, request.url.as_str()),
            method: request.method.to_ascii_uppercase(),
            url: request.url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

fn insert_row(conn: &rusqlite::Connection, generation: &str, row: &EntryRow, stored_at: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (generation, key, method, url, status, status_text, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(generation, key) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            generation,
            &row.key,
            &row.method,
            &row.url,
            row.status,
            &row.status_text,
            &row.headers_json,
            &row.body,
            stored_at,
        ],
    )?;
    Ok(())
}

fn decode_headers(json: &str) -> Result<Vec<(String, String)>, Error> {
    serde_json::from_str(json).map_err(|e| Error::CorruptEntry(format!("failed to decode headers: {e}")))
}

impl Cache {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    /// Generation name (the version tag).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for a request identity.
    ///
    /// Returns None on a miss; a miss is not an error.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let generation = self.name.clone();
        let key = request_key(&request.method, request.url.as_str());
        self.db
            .conn
            .call(move |conn| -> Result<Option<(u16, String, String, Vec<u8>)>, Error> {
                let result = conn.query_row(
                    "SELECT status, status_text, headers_json, body FROM entries
                     WHERE generation = ?1 AND key = ?2",
                    params![generation, key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?
            .map(|(status, status_text, headers_json, body)| {
                Ok(Response { status, status_text, headers: decode_headers(&headers_json)?, body: Bytes::from(body) })
            })
            .transpose()
    }

    /// Whether an entry exists for the request identity, without reading it.
    pub async fn contains(&self, request: &Request) -> Result<bool, Error> {
        let generation = self.name.clone();
        let key = request_key(&request.method, request.url.as_str());
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM entries WHERE generation = ?1 AND key = ?2)",
                    params![generation, key],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under the request identity, replacing any previous
    /// entry (last writer wins).
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let row = EntryRow::new(request, response)?;
        let generation = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                insert_row(conn, &generation, &row, &chrono::Utc::now().to_rfc3339())
            })
            .await
            .map_err(Error::from)
    }

    /// Fetch every request and store all responses, or store nothing.
    ///
    /// Returns the number of distinct entries stored. All fetches run
    /// concurrently. Any network failure or non-2xx status
    /// fails the whole operation before a single row is written; the rows
    /// are then committed in one transaction.
    pub async fn add_all<N>(&self, network: &N, requests: &[Request]) -> Result<usize, Error>
    where
        N: Network + ?Sized,
    {
        let responses = try_join_all(requests.iter().map(|request| async move {
            let response = network.fetch(request).await?;
            if !response.ok() {
                return Err(Error::HttpStatus { url: request.url.to_string(), status: response.status });
            }
            EntryRow::new(request, &response)
        }))
        .await?;

        let generation = self.name.clone();
        // requests resolving to the same identity share one row
        let count = responses.iter().map(|row| row.key.as_str()).collect::<HashSet<_>>().len();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let stored_at = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                for row in &responses {
                    insert_row(&tx, &generation, row, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(count)
    }

    /// URLs of stored entries in insertion order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.entries().await?.into_iter().map(|e| e.url).collect())
    }

    /// Metadata of every stored entry in insertion order.
    pub async fn entries(&self) -> Result<Vec<StoredEntry>, Error> {
        let generation = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String, u16, String, String, usize, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, method, status, status_text, headers_json, length(body), stored_at
                     FROM entries WHERE generation = ?1 ORDER BY rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![generation], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get::<_, i64>(5)? as usize,
                            row.get(6)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(url, method, status, status_text, headers_json, body_len, stored_at)| {
                Ok(StoredEntry {
                    url,
                    method,
                    status,
                    status_text,
                    headers: decode_headers(&headers_json)?,
                    body_len,
                    stored_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStorage;
    use url::Url;

    fn request(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    async fn open(name: &str) -> (CacheStorage, Cache) {
        let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
        let cache = storage.open(name).await.unwrap();
        (storage, cache)
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let (_storage, cache) = open("v2").await;
        let req = request("http://localhost:8080/index.html");
        let response = Response::new(200, "<html>shell</html>").with_header("Content-Type", "text/html");

        cache.put(&req, &response).await.unwrap();

        let found = cache.match_request(&req).await.unwrap().unwrap();
        assert_eq!(found, response);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let (_storage, cache) = open("v2").await;
        let req = request("http://localhost:8080/nope");
        assert!(cache.match_request(&req).await.unwrap().is_none());
        assert!(!cache.contains(&req).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces_entry() {
        let (_storage, cache) = open("v2").await;
        let req = request("http://localhost:8080/app.js");
        cache.put(&req, &Response::new(200, "old")).await.unwrap();
        cache.put(&req, &Response::new(200, "new")).await.unwrap();

        let found = cache.match_request(&req).await.unwrap().unwrap();
        assert_eq!(found.body, Bytes::from("new"));
        assert_eq!(cache.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let (_storage, cache) = open("v2").await;
        let req = request("http://localhost:8080/form").with_method("POST");
        let result = cache.put(&req, &Response::new(200, "")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
        let old = storage.open("v1").await.unwrap();
        let new = storage.open("v2").await.unwrap();
        let req = request("http://localhost:8080/index.html");

        old.put(&req, &Response::new(200, "v1 shell")).await.unwrap();

        assert!(new.match_request(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_after_generation_deleted_fails() {
        let (storage, cache) = open("v1").await;
        storage.delete("v1").await.unwrap();

        let result = cache.put(&request("http://localhost:8080/"), &Response::new(200, "")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_entries_metadata() {
        let (_storage, cache) = open("v2").await;
        cache
            .put(&request("http://localhost:8080/a"), &Response::new(200, "aaa"))
            .await
            .unwrap();
        cache
            .put(&request("http://localhost:8080/b"), &Response::new(404, ""))
            .await
            .unwrap();

        let entries = cache.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "http://localhost:8080/a");
        assert_eq!(entries[0].body_len, 3);
        assert_eq!(entries[1].status, 404);
        assert_eq!(entries[1].status_text, "Not Found");
    }
}
