//! Explicit server wiring.
//!
//! The builder accumulates handler sets and exactly one transport, then
//! `run` materializes the registries, composes a start callback that
//! attaches them to every server instance the transport creates (one per
//! session for the HTTP transports), and serves. No container, no globals:
//! anything a handler needs gets captured in its closure or carried on the
//! request context.

use std::sync::Arc;

use crate::error::RuntimeError;
use crate::protocol::{Implementation, ServerCapabilities};
use crate::registry::{
    CompletionRouter, Prompt, PromptRegistry, ResourceProvider, ResourceReader, ResourceRegistry,
    Tool, ToolRegistry,
};
use crate::server::ServerOptions;
use crate::transport::Transport;

const DEFAULT_NAME: &str = "mcp-runtime-server";
const DEFAULT_VERSION: &str = "0.0.1";

/// Builder for an MCP server application.
pub struct ServerBuilder {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    tools: Vec<Arc<dyn Tool>>,
    prompts: Vec<Arc<dyn Prompt>>,
    resources: Vec<Arc<dyn ResourceReader>>,
    resource_providers: Vec<Arc<dyn ResourceProvider>>,
    options: ServerOptions,
    transport: Option<Arc<dyn Transport>>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            tools: Vec::new(),
            prompts: Vec::new(),
            resources: Vec::new(),
            resource_providers: Vec::new(),
            options: ServerOptions::new(),
            transport: None,
        }
    }

    /// Server name returned to clients during `initialize`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Server version returned to clients during `initialize`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Capabilities advertised during `initialize`. Defaults to none, which
    /// most clients read as "this server can do nothing", so set it.
    pub fn with_capabilities(mut self, capabilities: ServerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompts.push(Arc::new(prompt));
        self
    }

    pub fn with_resource(mut self, resource: impl ResourceReader + 'static) -> Self {
        self.resources.push(Arc::new(resource));
        self
    }

    pub fn with_resource_provider(
        mut self,
        provider: impl ResourceProvider + 'static,
    ) -> Self {
        self.resource_providers.push(Arc::new(provider));
        self
    }

    /// Extra server options (start callbacks, initialized-notification
    /// override, version floor) merged with what the builder generates.
    pub fn with_server_options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// The transport to serve on. Keep a clone of the `Arc` to call
    /// `shutdown` later.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Wires everything together and serves until the transport stops.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NoTransport`] when no transport was configured
    /// (detected before any I/O happens), or whatever the transport's `run`
    /// reports.
    pub async fn run(self) -> Result<(), RuntimeError> {
        let transport = self.transport.ok_or(RuntimeError::NoTransport)?;

        let tools = Arc::new(ToolRegistry::new(self.tools));
        let prompts = Arc::new(PromptRegistry::new(self.prompts));
        let resources = Arc::new(ResourceRegistry::new(
            self.resources,
            self.resource_providers,
        ));
        let completions = Arc::new(CompletionRouter::new(prompts.clone(), resources.clone()));

        let options = self.options.on_server_start(move |server| {
            tools.clone().register_handlers(server);
            prompts.clone().register_handlers(server);
            resources.clone().register_handlers(server);
            completions.clone().register_handlers(server);
        });

        let implementation = Implementation::new(self.name, self.version);
        transport
            .run(self.capabilities, implementation, options)
            .await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_transport_fails_fast() {
        let result = ServerBuilder::new().run().await;
        assert!(matches!(result, Err(RuntimeError::NoTransport)));
    }

    #[test]
    fn test_defaults() {
        let builder = ServerBuilder::new();
        assert_eq!(builder.name, "mcp-runtime-server");
        assert_eq!(builder.version, "0.0.1");
        assert!(builder.transport.is_none());
    }
}
