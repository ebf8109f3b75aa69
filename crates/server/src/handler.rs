//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the coordinator and the cache store.
use crate::tools::{
    NotificationClickParams, NotificationPushParams, SwFetchParams,
    cache::{CacheGetParams, generations_impl, get_impl},
    lifecycle::{activate_impl, install_impl},
    notification::{click_impl, push_impl},
    sw_fetch::fetch_impl,
};

use gymgurus_client::Coordinator;
use gymgurus_core::CacheDb;
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
use std::sync::Arc;

/// The main MCP server handler for gymgurus-sw.
#[derive(Clone)]
pub struct GymGurusServer {
    tool_router: ToolRouter<Self>,
    coordinator: Arc<Coordinator>,
    cache: CacheDb,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl GymGurusServer {
    /// Create a new server handler.
    pub fn new(coordinator: Arc<Coordinator>, cache: CacheDb) -> Self {
        Self { tool_router: Self::tool_router(), coordinator, cache }
    }

    /// Populate the current cache generation with the application shell.
    #[tool(
        description = "Install the current cache generation: fetch every shell resource and store them together. Fails without writing anything if any resource fails."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.coordinator).await
    }

    /// Drop stale generations and start serving intercepted requests.
    #[tool(description = "Activate the installed generation. Deletes every other cache generation and returns their names.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.coordinator).await
    }

    /// Route one outgoing request through the caching policies.
    #[tool(
        description = "Intercept a request. Returns the routing decision, the response served and its source (network, cache or offline)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Handle a push message. Returns the notification to display.")]
    async fn notification_push(&self, params: Parameters<NotificationPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.coordinator, params.0)
    }

    #[tool(description = "Handle a notification click. Returns whether to focus an open window or open a new one.")]
    async fn notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.coordinator, params.0)
    }

    /// Read the current generation's stored response for a request.
    #[tool(description = "Retrieve the stored response for a method and URL from the current cache generation.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "List cache generations with their entry counts.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.cache, self.coordinator.generation()).await
    }
}

impl ServerHandler for GymGurusServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gymgurus-sw".into(),
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
