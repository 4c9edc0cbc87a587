//! sw_install, sw_activate and worker_status tool implementations.
//!
//! Install and activate return only after the worker has finished the
//! event, so a host may issue them back to back.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use shellcache_core::{Network, Worker, WorkerState};

use super::json_result;

/// Output from the worker_status tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerStatusOutput {
    /// Current generation tag.
    pub cache_name: String,
    /// Lifecycle state of the worker.
    pub state: WorkerState,
    /// All generations present in the store, oldest first.
    pub generations: Vec<String>,
    /// Number of entries in the current generation.
    pub entries: usize,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<N: Network>(worker: &Worker<N>) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<N: Network>(worker: &Worker<N>) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}

/// Implementation of the worker_status tool.
pub async fn status_impl<N: Network>(worker: &Worker<N>) -> Result<CallToolResult, McpError> {
    let cache_name = worker.config().cache_name.clone();
    let storage = worker.storage();
    let output = WorkerStatusOutput {
        state: worker.state().await,
        generations: storage.keys().await?,
        entries: storage.cache(&cache_name).keys().await?.len(),
        cache_name,
    };
    json_result(&output)
}
