//! Install handler: populate the current generation from the manifest.

use std::sync::Arc;

use serde::Serialize;

use crate::Error;
use crate::cache::CacheStorage;
use crate::http::Request;
use crate::network::Network;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    /// Generation that was opened and populated.
    pub generation: String,
    /// Number of manifest entries stored.
    pub entries: usize,
}

/// Opens the generation named by the version tag and stores every manifest
/// URL in it.
pub struct Installer<N> {
    storage: CacheStorage,
    network: Arc<N>,
    cache_name: String,
    manifest: Vec<Request>,
}

impl<N: Network> Installer<N> {
    pub fn new(storage: CacheStorage, network: Arc<N>, cache_name: String, manifest: Vec<Request>) -> Self {
        Self { storage, network, cache_name, manifest }
    }

    /// Run the install.
    ///
    /// Returns only once population has finished. Population is
    /// all-or-nothing: if any manifest URL fails, nothing is stored and the
    /// error is returned so the host can retry later.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.populate().await.map_err(|source| {
            tracing::warn!(generation = %self.cache_name, error = %source, "install failed");
            Error::InstallFailed { generation: self.cache_name.clone(), source: Box::new(source) }
        })
    }

    /// Whether the current generation already holds every manifest entry,
    /// for instance from an install in an earlier run.
    pub async fn is_installed(&self) -> Result<bool, Error> {
        if !self.storage.has(&self.cache_name).await? {
            return Ok(false);
        }

        let cache = self.storage.cache(&self.cache_name);
        for request in &self.manifest {
            if !cache.contains(request).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn populate(&self) -> Result<InstallReport, Error> {
        let cache = self.storage.open(&self.cache_name).await?;
        tracing::info!(generation = %self.cache_name, "opened cache");

        let entries = cache.add_all(self.network.as_ref(), &self.manifest).await?;
        tracing::info!(generation = %self.cache_name, entries, "populated cache");

        Ok(InstallReport { generation: self.cache_name.clone(), entries })
    }
}
