//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{CacheGetParams, InterceptParams, get_impl, intercept_impl, keys_impl, status_impl};

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
use swcache_client::Interceptor;
use url::Url;

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwcacheServer {
    interceptor: Arc<Interceptor>,
    origin: Url,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwcacheServer {
    /// Create a new server handler around a shared interceptor.
    pub fn new(interceptor: Arc<Interceptor>, origin: Url) -> Self {
        Self { interceptor, origin, tool_router: Self::tool_router() }
    }

    /// Run one request through the offline cache.
    #[tool(
        description = "Run a request through the offline cache. Navigations are served network-first with an offline fallback, static assets cache-first; other requests go to the network uncached."
    )]
    async fn intercept(&self, params: Parameters<InterceptParams>) -> Result<CallToolResult, McpError> {
        intercept_impl(&self.interceptor, &self.origin, params.0).await
    }

    /// Get a cached response by URL.
    #[tool(description = "Get the response cached for GET <url> in the current cache generation.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.interceptor.lifecycle(), &self.origin, params.0).await
    }

    /// List cached URLs.
    #[tool(description = "List the URLs cached in the current cache generation.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(self.interceptor.lifecycle()).await
    }

    /// Report the lifecycle state.
    #[tool(description = "Report the cache lifecycle state, the running version and the generations on disk.")]
    async fn lifecycle_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(self.interceptor.lifecycle()).await
    }
}

impl ServerHandler for SwcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline request cache. Use `intercept` to issue requests, `cache_keys` and `cache_get` to inspect \
                 the current generation, and `lifecycle_status` to see whether the cache is active."
                    .into(),
            ),
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
