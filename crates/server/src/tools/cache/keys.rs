//! cache_keys tool implementation.
//!
//! Lists generation names, or the entries of one generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{Error, Network, StoredEntry, Worker};

use super::super::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// List the entries of this generation instead of the generation names.
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheKeysOutput {
    Generations { generations: Vec<String> },
    Entries { generation: String, entries: Vec<StoredEntry> },
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl<N: Network>(worker: &Worker<N>, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let storage = worker.storage();

    let output = match params.generation {
        None => CacheKeysOutput::Generations { generations: storage.keys().await? },
        Some(generation) => {
            if !storage.has(&generation).await? {
                return Err(Error::InvalidInput(format!("no cache generation named {generation}")).into());
            }
            let entries = storage.cache(&generation).entries().await?;
            CacheKeysOutput::Entries { generation, entries }
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::lifecycle::install_impl;
    use crate::tools::testing::{output, worker};

    #[tokio::test]
    async fn test_keys_lists_generations() {
        let (worker, _network) = worker("v2").await;
        install_impl(&worker).await.unwrap();

        let out = output(&keys_impl(&worker, CacheKeysParams { generation: None }).await.unwrap());
        assert_eq!(out["generations"], serde_json::json!(["v2"]));
    }

    #[tokio::test]
    async fn test_keys_lists_entries() {
        let (worker, _network) = worker("v2").await;
        install_impl(&worker).await.unwrap();

        let params = CacheKeysParams { generation: Some("v2".into()) };
        let out = output(&keys_impl(&worker, params).await.unwrap());
        let entries = out["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["url"], "http://localhost:8080/index.html");
        assert_eq!(entries[1]["status"], 200);
    }

    #[tokio::test]
    async fn test_keys_unknown_generation() {
        let (worker, _network) = worker("v2").await;
        let params = CacheKeysParams { generation: Some("v1".into()) };
        assert!(keys_impl(&worker, params).await.is_err());
    }
}
