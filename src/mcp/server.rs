use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::tools::executor::ToolExecutor;
use crate::tools::ToolRegistry;

const INSTRUCTIONS: &str = "AI DJ music server. Use search_music to find a song by title \
    (and optionally artist), search_music_by_voice to find one from a spoken request, and \
    play_mp3_local to play a resolved URL on the host for debugging. Every tool answers with \
    a JSON object whose `success` field tells whether it worked.";

/// MCP front end that serves a [`ToolRegistry`] over any rmcp transport.
#[derive(Clone)]
pub struct DjServer {
    executor: Arc<ToolExecutor>,
}

impl DjServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            executor: Arc::new(ToolExecutor::new(registry)),
        }
    }

    fn tool_definitions(&self) -> Vec<McpTool> {
        self.executor
            .registry()
            .list_tools()
            .iter()
            .map(|tool| {
                let schema = match tool.parameters_schema() {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                McpTool::new(
                    tool.name().to_string(),
                    tool.description().to_string(),
                    Arc::new(schema),
                )
            })
            .collect()
    }

    async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        if self.executor.registry().get(name).is_none() {
            return Err(McpError::invalid_params(format!("unknown tool: {}", name), None));
        }

        let params = Value::Object(arguments.unwrap_or_default());
        let response = self.executor.execute(name, params).await.map_err(|e| {
            error!("Tool '{}' failed: {:#}", name, e);
            McpError::internal_error(format!("{:#}", e), None)
        })?;

        let text = serde_json::to_string_pretty(&response)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

impl ServerHandler for DjServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.tool_definitions();
        debug!("Listing {} tools", tools.len());
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}
