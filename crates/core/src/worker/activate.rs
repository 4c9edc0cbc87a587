//! Activate handler: reap superseded generations.

use futures_util::future::join_all;
use serde::Serialize;

use crate::Error;
use crate::cache::CacheStorage;

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivationReport {
    /// The current generation tag.
    pub current: String,
    /// Generations that were deleted, in enumeration order.
    pub deleted: Vec<String>,
}

/// Deletes every generation whose name differs from the current tag.
pub struct Activator {
    storage: CacheStorage,
    cache_name: String,
}

impl Activator {
    pub fn new(storage: CacheStorage, cache_name: String) -> Self {
        Self { storage, cache_name }
    }

    /// Run the activation.
    ///
    /// Deletions run concurrently and all of them settle before this
    /// returns. A generation that disappeared since enumeration is skipped.
    /// If any deletion fails the first error is returned after the others
    /// have finished.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != &self.cache_name)
            .collect();

        let results = join_all(stale.iter().map(|name| async move {
            tracing::info!(generation = %name, "deleting old cache");
            self.storage.delete(name).await
        }))
        .await;

        let mut deleted = Vec::with_capacity(stale.len());
        let mut first_error = None;
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => deleted.push(name),
                Ok(false) => tracing::debug!(generation = %name, "generation already gone"),
                Err(e) => {
                    tracing::warn!(generation = %name, error = %e, "failed to delete old cache");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        Ok(ActivationReport { current: self.cache_name.clone(), deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;

    #[tokio::test]
    async fn test_activate_keeps_only_current() {
        let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
        for name in ["v1", "v2", "v3"] {
            storage.open(name).await.unwrap();
        }

        let report = Activator::new(storage.clone(), "v3".into()).activate().await.unwrap();

        assert_eq!(report.deleted, vec!["v1", "v2"]);
        assert_eq!(storage.keys().await.unwrap(), vec!["v3"]);
    }

    #[tokio::test]
    async fn test_activate_without_stale_generations() {
        let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
        storage.open("v3").await.unwrap();

        let report = Activator::new(storage, "v3".into()).activate().await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(report.current, "v3");
    }
}
