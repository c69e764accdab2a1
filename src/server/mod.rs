//! MCP server core: lifecycle handlers, version negotiation, and the
//! response fan-out channel.
//!
//! A server is a router plus a channel. `handle` pushes whatever envelopes a
//! frame produced into the channel for a transport writer to drain (stdio,
//! SSE); `handle_and_get_responses` hands them back synchronously instead
//! (streamable HTTP). Built-in handlers for `initialize`, `ping`, and
//! `notifications/initialized` are registered at construction and may be
//! overridden through [`ServerOptions`] or replaced by start callbacks.

pub mod options;

pub use options::ServerOptions;

use std::future::ready;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::jsonrpc::{JsonRpcResponse, JsonRpcRouter, Request};
use crate::protocol::requests::{InitializeRequest, InitializedNotification, PingRequest};
use crate::protocol::results::{EmptyResult, InitializeResult};
use crate::protocol::version;
use crate::protocol::{Implementation, ServerCapabilities};
use crate::session::RequestContext;

/// Buffer size of the response channel. Multi-producer (handlers, built-ins),
/// single consumer (the transport writer); a small buffer only smooths
/// bursts, backpressure is intended.
const RESPONSE_CHANNEL_CAPACITY: usize = 32;

/// One MCP server instance.
///
/// Handler tables are populated during construction (built-ins, then start
/// callbacks) and are read-only once the server is shared with a transport,
/// which is why `handle` takes `&self` and instances tolerate concurrent
/// calls.
pub struct McpServer {
    router: JsonRpcRouter,
    response_tx: mpsc::Sender<JsonRpcResponse>,
    response_rx: Mutex<Option<mpsc::Receiver<JsonRpcResponse>>>,
}

impl McpServer {
    /// Constructs a server advertising `capabilities` and `server_info`.
    pub fn new(
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Self {
        let (response_tx, response_rx) = mpsc::channel(RESPONSE_CHANNEL_CAPACITY);
        let mut server = Self {
            router: JsonRpcRouter::new(),
            response_tx,
            response_rx: Mutex::new(Some(response_rx)),
        };

        server.register_lifecycle_handlers(capabilities, server_info, &options);

        for callback in &options.start_callbacks {
            callback(&mut server);
        }

        server
    }

    fn register_lifecycle_handlers(
        &mut self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: &ServerOptions,
    ) {
        let minimum = options.minimum_protocol_version;
        self.set_request_handler(move |_ctx, request: InitializeRequest| {
            let capabilities = capabilities.clone();
            let server_info = server_info.clone();
            let negotiated = version::negotiate(&request.params.protocol_version, minimum);
            tracing::debug!(
                requested = %request.params.protocol_version,
                negotiated = %negotiated,
                client = %request.params.client_info.name,
                "initialize"
            );
            ready(Ok(InitializeResult {
                protocol_version: negotiated.as_str().to_string(),
                capabilities,
                server_info,
                instructions: None,
            }))
        });

        self.set_request_handler(|_ctx, _request: PingRequest| ready(Ok(EmptyResult {})));

        match &options.initialized_callback {
            Some(callback) => {
                let callback = callback.clone();
                self.set_notification_handler(
                    move |ctx, notification: InitializedNotification| {
                        callback(ctx, notification);
                        ready(())
                    },
                );
            }
            None => {
                self.set_notification_handler(|_ctx, _notification: InitializedNotification| {
                    tracing::debug!("client finished initialization");
                    ready(())
                });
            }
        }
    }

    /// Registers a request handler for `R::METHOD`, replacing any previous
    /// one.
    pub fn set_request_handler<R, H, Fut, Out>(&mut self, handler: H)
    where
        R: Request,
        H: Fn(RequestContext, R) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Out, crate::error::JsonRpcError>>
            + Send
            + 'static,
        Out: serde::Serialize + Send + 'static,
    {
        self.router.set_request_handler(handler);
    }

    /// Registers a notification handler for `R::METHOD`, replacing any
    /// previous one.
    pub fn set_notification_handler<R, H, Fut>(&mut self, handler: H)
    where
        R: Request,
        H: Fn(RequestContext, R) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.router.set_notification_handler(handler);
    }

    /// Routes one frame and pushes every produced envelope into the response
    /// channel. Used by transports that deliver responses out-of-band of the
    /// request (stdio, SSE).
    pub async fn handle(&self, ctx: RequestContext, payload: &[u8]) {
        let responses = self.router.handle(ctx, payload).await;
        for response in responses.into_iter().flatten() {
            if self.response_tx.send(response).await.is_err() {
                tracing::warn!("response channel consumer is gone, dropping response");
                return;
            }
        }
    }

    /// Routes one frame and returns its response slots directly, one per
    /// request in input order; `None` marks a processed notification. Used by
    /// the streamable HTTP transport, which answers in the POST response.
    pub async fn handle_and_get_responses(
        &self,
        ctx: RequestContext,
        payload: &[u8],
    ) -> Vec<Option<JsonRpcResponse>> {
        self.router.handle(ctx, payload).await
    }

    /// Hands out the consumer end of the response channel. Yields `Some` only
    /// once; the transport writer owns it for the life of the server.
    pub fn take_responses(&self) -> Option<mpsc::Receiver<JsonRpcResponse>> {
        self.response_rx.lock().take()
    }
}
