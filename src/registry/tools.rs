//! Tool registry: `tools/list` and `tools/call`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::JsonRpcError;
use crate::protocol::requests::{CallToolRequest, ListToolsRequest};
use crate::protocol::results::{CallToolResult, ListToolsResult};
use crate::server::McpServer;
use crate::session::RequestContext;

use super::{RegistryError, TOOL_NOT_FOUND_CODE};

/// A tool the server can call on behalf of the client.
///
/// Tool-level failures belong in [`CallToolResult::is_error`] so the model
/// gets to see them; returning an error through JSON-RPC is reserved for
/// "this tool does not exist" and other dispatch-level problems.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The descriptor advertised via `tools/list`; its `name` is the
    /// dispatch key.
    fn definition(&self) -> crate::protocol::results::Tool;

    /// Executes the tool.
    async fn call(
        &self,
        ctx: &RequestContext,
        arguments: Option<Map<String, Value>>,
    ) -> CallToolResult;
}

/// Name-indexed set of tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let tools = tools
            .into_iter()
            .map(|tool| (tool.definition().name.clone(), tool))
            .collect();
        Self { tools }
    }

    /// Advertised descriptors, sorted by name for stable listings.
    pub fn definitions(&self) -> Vec<crate::protocol::results::Tool> {
        let mut definitions: Vec<_> = self.tools.values().map(|tool| tool.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Dispatches a call to the named tool.
    pub async fn call(
        &self,
        ctx: &RequestContext,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, RegistryError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| RegistryError::ToolNotFound {
                name: name.to_string(),
            })?;
        Ok(tool.call(ctx, arguments).await)
    }

    /// Attaches `tools/list` and `tools/call` handlers to `server`.
    pub fn register_handlers(self: Arc<Self>, server: &mut McpServer) {
        let registry = self.clone();
        server.set_request_handler(move |_ctx, _request: ListToolsRequest| {
            let tools = registry.definitions();
            std::future::ready(Ok(ListToolsResult {
                tools,
                next_cursor: None,
            }))
        });

        let registry = self;
        server.set_request_handler(move |ctx, request: CallToolRequest| {
            let registry = registry.clone();
            async move {
                registry
                    .call(&ctx, &request.params.name, request.params.arguments)
                    .await
                    .map_err(|e| JsonRpcError::server_error(TOOL_NOT_FOUND_CODE, e.to_string()))
            }
        });
    }
}
