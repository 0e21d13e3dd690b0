//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::{
    CacheClearParams, CacheStatsParams, OfflineModeParams, SearchParams, clear_impl, offline_impl, search_impl,
    stats_impl,
};

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

/// The main MCP server handler for roost.
#[derive(Clone)]
pub struct RoostServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl RoostServer {
    /// Create a new server handler over the shared state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// Search listings by free-text term.
    ///
    /// Repeat searches for the same term (ignoring case) are served from the local cache.
    #[tool(
        description = "Search listings by free-text term. Returns matching records; repeat terms are served from the local cache (cache_hit=true)."
    )]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.state, params.0).await
    }

    /// Clear every local cache: images, the replica and the search cache.
    #[tool(description = "Clear the image cache, the local replica and the search cache. Reports any step that failed.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        clear_impl(&self.state, params.0).await
    }

    /// Pause or resume replica sync.
    #[tool(
        description = "Enable or disable offline mode. While offline, the local replica stops syncing with the remote catalog."
    )]
    async fn offline_mode(&self, params: Parameters<OfflineModeParams>) -> Result<CallToolResult, McpError> {
        offline_impl(&self.state, params.0).await
    }

    /// Report storage usage.
    #[tool(description = "Report disk usage of the search cache, the replica and the image cache, in bytes and MB.")]
    async fn cache_stats(&self, params: Parameters<CacheStatsParams>) -> Result<CallToolResult, McpError> {
        stats_impl(&self.state, params.0).await
    }
}

impl ServerHandler for RoostServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "roost".into(),
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
