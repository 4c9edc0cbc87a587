//! Write-after-respond persistence.
//!
//! A response handed back to the host is stored as a clone in a spawned
//! task. The caller never waits for it; the handle exists so the outcome of
//! the write can still be observed.

use tokio::task::JoinHandle;

use crate::Error;
use crate::cache::CacheStorage;
use crate::http::{Request, Response};

/// Handle to a background cache write.
///
/// Dropping the handle detaches the task; the write still runs.
#[derive(Debug)]
pub struct PersistHandle {
    url: String,
    task: JoinHandle<Result<(), Error>>,
}

impl PersistHandle {
    /// Spawn a task storing `response` under `request` in `generation`.
    ///
    /// The generation is opened inside the task, so it is recreated if it
    /// vanished since the request started. Failures are logged and dropped.
    pub(crate) fn spawn(storage: CacheStorage, generation: String, request: Request, response: Response) -> Self {
        let url = request.url.to_string();
        let task_url = url.clone();

        let task = tokio::spawn(async move {
            let result = match storage.open(&generation).await {
                Ok(cache) => cache.put(&request, &response).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    tracing::debug!(generation = %generation, url = %task_url, "persisted response");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(generation = %generation, url = %task_url, error = %e, "failed to persist response");
                    Err(Error::PersistFailed(format!("{task_url}: {e}")))
                }
            }
        });

        Self { url, task }
    }

    /// URL of the request being persisted.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the write to settle.
    pub async fn wait(self) -> Result<(), Error> {
        self.task
            .await
            .map_err(|e| Error::PersistFailed(format!("{}: persist task aborted: {e}", self.url)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use url::Url;

    #[tokio::test]
    async fn test_persist_writes_entry() {
        let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
        let request = Request::get(Url::parse("http://localhost:8080/app.js").unwrap());

        let handle =
            PersistHandle::spawn(storage.clone(), "v2".into(), request.clone(), Response::new(200, "console.log(1)"));
        assert_eq!(handle.url(), "http://localhost:8080/app.js");
        handle.wait().await.unwrap();

        let cache = storage.open("v2").await.unwrap();
        assert!(cache.match_request(&request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_persist_failure_is_observable() {
        let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
        let request = Request::get(Url::parse("http://localhost:8080/form").unwrap()).with_method("POST");

        let handle = PersistHandle::spawn(storage, "v2".into(), request, Response::new(200, ""));
        let result = handle.wait().await;
        assert!(matches!(result, Err(Error::PersistFailed(_))));
    }
}
