//! MCP tool implementations.
//!
//! Lifecycle tools deliver the worker's install, fetch and activate events;
//! cache tools inspect the generations on disk.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;

#[cfg(test)]
pub(crate) mod testing;

use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::Serialize;
use shellcache_core::Error;

/// How a response body is carried in tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
    /// The body is valid UTF-8 and is sent as is.
    Utf8,
    /// Standard base64 of the raw bytes.
    Base64,
}

/// Encode a body so the exact bytes can be recovered by the host.
pub(crate) fn encode_body(body: &[u8]) -> (String, BodyEncoding) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), BodyEncoding::Utf8),
        Err(_) => (STANDARD.encode(body), BodyEncoding::Base64),
    }
}

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
