//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to the
//! controller. The server doubles as the page host: it owns the in-memory
//! shell whose windows and notifications the controller drives.

use std::sync::Arc;

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

use safetrack_client::{CacheController, HttpNetwork, MemoryShell};

use crate::tools::{
    cache::{CacheListParams, CachePurgeParams, list_impl, purge_impl},
    fetch::{SwFetchParams, fetch_impl, settle_impl},
    lifecycle::{activate_impl, install_impl},
    push::{SwNotificationClickParams, SwPushParams, click_impl, push_impl},
    status::status_impl,
};

/// The main MCP server handler for safetrack-sw.
#[derive(Clone)]
pub struct SafeTrackServer {
    controller: Arc<CacheController<HttpNetwork>>,
    shell: Arc<MemoryShell>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SafeTrackServer {
    /// Create a new server handler.
    pub fn new(controller: Arc<CacheController<HttpNetwork>>, shell: Arc<MemoryShell>) -> Self {
        Self { controller, shell, tool_router: Self::tool_router() }
    }

    #[tool(description = "Run the install event: precache the app shell into the current generation. \
                          Activates immediately when the install signals skip-waiting.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(self.controller.as_ref(), self.shell.as_ref()).await
    }

    #[tool(description = "Run the activate event: delete partitions of other generations and claim open pages.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(self.controller.as_ref(), self.shell.as_ref()).await
    }

    /// Issue a request as the page would.
    ///
    /// Bypassed requests are fetched directly from the network, as the
    /// browser does when the controller declines to intercept.
    #[tool(description = "Issue a request through the controller. Returns the policy applied, where the \
                          response came from, and the response itself.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.controller.as_ref(), params.0).await
    }

    #[tool(description = "Wait for background revalidations to finish.")]
    async fn sw_settle(&self) -> Result<CallToolResult, McpError> {
        settle_impl(self.controller.as_ref()).await
    }

    #[tool(description = "Deliver a push message. Shows a notification unless the payload is absent.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(self.controller.as_ref(), &self.shell, params.0).await
    }

    #[tool(description = "Click a shown notification: focus a window already on its target or open one.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(self.controller.as_ref(), &self.shell, params.0).await
    }

    #[tool(description = "List cache partitions, or the entries of one partition.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.controller.db(), params.0).await
    }

    #[tool(description = "Delete a cache partition and all of its entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.controller.db(), params.0).await
    }

    #[tool(description = "Report the generation state, the active generation and every partition.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(self.controller.as_ref()).await
    }
}

impl ServerHandler for SafeTrackServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "safetrack-sw".into(),
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
