//! Construction-time options applied to every server instance a transport
//! creates.
//!
//! Transports that allocate one server per session (streamable HTTP, SSE)
//! clone these options for each instance, so everything in here is a value or
//! an `Arc`'d callback.

use std::sync::Arc;

use crate::protocol::requests::InitializedNotification;
use crate::protocol::version::ProtocolVersion;
use crate::session::RequestContext;

use super::McpServer;

/// Callback invoked with every freshly constructed server, before it serves
/// its first request. This is how handler sets (tool/prompt/resource
/// registries) attach themselves to per-session instances.
pub type ServerStartCallback = Arc<dyn Fn(&mut McpServer) + Send + Sync>;

/// Replacement handler for `notifications/initialized`.
pub type InitializedCallback = Arc<dyn Fn(RequestContext, InitializedNotification) + Send + Sync>;

/// Options accepted by [`McpServer::new`](super::McpServer::new).
#[derive(Clone, Default)]
pub struct ServerOptions {
    pub(crate) start_callbacks: Vec<ServerStartCallback>,
    pub(crate) initialized_callback: Option<InitializedCallback>,
    pub(crate) minimum_protocol_version: Option<ProtocolVersion>,
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback run against every new server instance. Callbacks run
    /// in registration order, after the built-in lifecycle handlers are in
    /// place (so they may override them).
    pub fn on_server_start(
        mut self,
        callback: impl Fn(&mut McpServer) + Send + Sync + 'static,
    ) -> Self {
        self.start_callbacks.push(Arc::new(callback));
        self
    }

    /// Replaces the default `notifications/initialized` handler.
    pub fn on_initialized(
        mut self,
        callback: impl Fn(RequestContext, InitializedNotification) + Send + Sync + 'static,
    ) -> Self {
        self.initialized_callback = Some(Arc::new(callback));
        self
    }

    /// Sets the protocol-version negotiation floor.
    pub fn minimum_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.minimum_protocol_version = Some(version);
        self
    }
}

impl std::fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerOptions")
            .field("start_callbacks", &self.start_callbacks.len())
            .field(
                "initialized_callback",
                &self.initialized_callback.is_some(),
            )
            .field("minimum_protocol_version", &self.minimum_protocol_version)
            .finish()
    }
}
