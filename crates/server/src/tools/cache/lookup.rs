//! cache_match tool implementation.
//!
//! Reads a stored response from the current generation without touching
//! the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{Error, Network, Request, Worker};

use super::super::{BodyEncoding, encode_body, json_result};

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute or root-relative URL to look up.
    pub url: String,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_encoding: BodyEncoding,
}

/// Implementation of the cache_match tool.
pub async fn match_impl<N: Network>(worker: &Worker<N>, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let request = Request::get(worker.resolve(&params.url)?);
    let generation = worker.config().cache_name.clone();

    let response = worker
        .storage()
        .cache(&generation)
        .match_request(&request)
        .await?
        .ok_or_else(|| Error::InvalidInput(format!("no cached entry for {} in {generation}", request.url)))?;

    let (body, body_encoding) = encode_body(&response.body);
    let output = CacheMatchOutput {
        generation,
        url: request.url.to_string(),
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        body,
        body_encoding,
    };

    json_result(&output)
}
