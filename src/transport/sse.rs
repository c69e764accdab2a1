//! Legacy SSE transport: the `GET /sse` + `POST /message` endpoint pair.
//!
//! Superseded by the streamable HTTP transport, kept for clients that still
//! speak the older shape. `GET /sse` allocates a session plus a dedicated
//! server instance and answers with an event stream: first an `endpoint`
//! event whose data is the POST URL carrying `?sessionId=<uuid>`, then one
//! `message` event per response the server produces, with `:keep-alive`
//! comments at a configurable interval. `POST /message?sessionId=<uuid>`
//! feeds a frame to the paired server and returns 202 Accepted; responses
//! flow back through the GET stream.
//!
//! The stream ends on client disconnect or transport shutdown; either way
//! the session and its server instance are dropped.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use dashmap::DashMap;
use http::StatusCode;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::RuntimeError;
use crate::jsonrpc::JsonRpcResponse;
use crate::protocol::{Implementation, ServerCapabilities};
use crate::server::{McpServer, ServerOptions};
use crate::session::{RequestContext, SessionManager};

use super::{encode_response, Transport};

/// Path serving the event stream.
pub const SSE_PATH: &str = "/sse";
/// Path accepting client-to-server frames.
pub const MESSAGE_PATH: &str = "/message";

/// Bind address and keep-alive cadence for the transport.
#[derive(Debug, Clone)]
pub struct SseServerConfig {
    pub host: String,
    pub port: u16,
    /// Interval between `:keep-alive` comments on idle streams.
    pub keep_alive_interval: Duration,
}

impl Default for SseServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            keep_alive_interval: Duration::from_secs(5),
        }
    }
}

impl SseServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The legacy SSE transport.
pub struct SseTransport {
    config: SseServerConfig,
    session_manager: Arc<SessionManager>,
    shutting_down: CancellationToken,
    stopped: CancellationToken,
}

impl SseTransport {
    pub fn new() -> Self {
        Self::with_config(SseServerConfig::default())
    }

    pub fn with_config(config: SseServerConfig) -> Self {
        Self {
            config,
            session_manager: Arc::new(SessionManager::new()),
            shutting_down: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    /// Builds the axum router serving both endpoints.
    pub fn router(
        &self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Router {
        let state = Arc::new(SseState {
            servers: DashMap::new(),
            session_manager: self.session_manager.clone(),
            capabilities,
            server_info,
            options,
            keep_alive_interval: self.config.keep_alive_interval,
            shutting_down: self.shutting_down.clone(),
        });
        Router::new()
            .route(SSE_PATH, get(sse_handler))
            .route(MESSAGE_PATH, post(message_handler))
            .with_state(state)
    }
}

impl Default for SseTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn run(
        &self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Result<(), RuntimeError> {
        let app = self.router(capabilities, server_info, options);
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        tracing::info!(addr = %self.config.bind_addr(), "SSE transport listening");

        let shutdown = self.shutting_down.clone();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        self.stopped.cancel();
        served?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.shutting_down.cancel();
        self.stopped.cancelled().await;
        Ok(())
    }

    fn session_manager(&self) -> Arc<SessionManager> {
        self.session_manager.clone()
    }
}

struct SseState {
    servers: DashMap<Uuid, Arc<McpServer>>,
    session_manager: Arc<SessionManager>,
    capabilities: ServerCapabilities,
    server_info: Implementation,
    options: ServerOptions,
    keep_alive_interval: Duration,
    shutting_down: CancellationToken,
}

/// Removes the session and its server when the stream is dropped, whether by
/// disconnect or shutdown.
struct StreamCleanup {
    state: Arc<SseState>,
    session_id: Uuid,
}

impl Drop for StreamCleanup {
    fn drop(&mut self) {
        self.state.servers.remove(&self.session_id);
        self.state.session_manager.delete(self.session_id);
        tracing::info!(session_id = %self.session_id, "SSE client disconnected");
    }
}

struct SseStreamState {
    responses: mpsc::Receiver<JsonRpcResponse>,
    endpoint_sent: bool,
    shutdown: CancellationToken,
    _cleanup: StreamCleanup,
}

async fn sse_handler(State(state): State<Arc<SseState>>) -> impl IntoResponse {
    let session_id = Uuid::new_v4();
    let server = Arc::new(McpServer::new(
        state.capabilities.clone(),
        state.server_info.clone(),
        state.options.clone(),
    ));
    let responses = server
        .take_responses()
        .expect("a freshly constructed server always has its response channel");
    state.servers.insert(session_id, server);
    state.session_manager.resolve_or_create(session_id);
    tracing::info!(session_id = %session_id, "SSE client connected");

    let keep_alive_interval = state.keep_alive_interval;
    let stream_state = SseStreamState {
        responses,
        endpoint_sent: false,
        shutdown: state.shutting_down.clone(),
        _cleanup: StreamCleanup {
            state: state.clone(),
            session_id,
        },
    };

    let stream = futures_util::stream::unfold(stream_state, move |mut st| async move {
        if !st.endpoint_sent {
            st.endpoint_sent = true;
            let endpoint = format!("{MESSAGE_PATH}?sessionId={session_id}");
            return Some((
                Ok::<Event, Infallible>(Event::default().event("endpoint").data(endpoint)),
                st,
            ));
        }
        tokio::select! {
            _ = st.shutdown.cancelled() => {
                // No way to tell the client the server is going away; closing
                // the stream lets it reconnect to a fresh instance.
                None
            }
            received = st.responses.recv() => {
                let response = received?;
                let event = Event::default().event("message").data(encode_response(&response));
                Some((Ok(event), st))
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(keep_alive_interval)
            .text("keep-alive"),
    )
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn message_handler(
    State(state): State<Arc<SseState>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(raw) = query.session_id.filter(|value| !value.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "sessionId is required").into_response();
    };
    let Ok(session_id) = Uuid::parse_str(&raw) else {
        return (StatusCode::BAD_REQUEST, "sessionId is not a valid UUID").into_response();
    };
    let Some(server) = state
        .servers
        .get(&session_id)
        .map(|entry| entry.value().clone())
    else {
        return (StatusCode::NOT_FOUND, "session not found").into_response();
    };

    let session = state.session_manager.resolve_or_create(session_id);
    let ctx = RequestContext::for_session(session)
        .with_shutdown(state.shutting_down.clone())
        .with_cancellation(state.shutting_down.child_token());

    server.handle(ctx, &body).await;
    (StatusCode::ACCEPTED, "Accepted").into_response()
}
