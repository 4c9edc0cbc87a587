//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker's event handlers.
use std::sync::Arc;

use crate::tools::cache::{CacheKeysParams, CacheMatchParams, keys_impl, match_impl};
use crate::tools::lifecycle::{activate_impl, install_impl, status_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::HttpNetwork;
use shellcache_core::Worker;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker<HttpNetwork>>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler around a configured worker.
    pub fn new(worker: Worker<HttpNetwork>) -> Self {
        Self { tool_router: Self::tool_router(), worker: Arc::new(worker) }
    }

    /// Run the install event.
    #[tool(
        description = "Run the install event: open the configured cache generation and store every manifest URL. All-or-nothing."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    /// Run the activate event.
    #[tool(description = "Run the activate event: delete every cache generation except the current one.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Dispatch a request through the fetch handler.
    ///
    /// Cache-first for external assets, network-first for site content.
    /// A failed fetch with nothing to fall back on is reported as `no_fallback`.
    #[tool(
        description = "Intercept a request as the worker would. Returns the classification, policy action, and the response with its source (cache, network, shell, synthesized)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report the worker lifecycle state and the cache generations in the store.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    #[tool(description = "List cache generation names, or the stored entries of one generation.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker, params.0).await
    }

    #[tool(description = "Read a stored response from the current cache generation without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
