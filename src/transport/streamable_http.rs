//! Streamable HTTP transport: a single endpoint accepting POST and DELETE.
//!
//! Session contract: the `Mcp-Session-Id` header carries a canonical
//! hyphenated UUIDv4. A POST without one allocates a session plus a dedicated
//! server instance and returns the new id in the response header; a POST with
//! one resolves it (unknown or malformed ids are 404). DELETE terminates the
//! session (400 on a missing/malformed header, 404 when unknown, 204 on
//! success). Any other method on the endpoint is 405.
//!
//! Response promotion for a POST body:
//!
//! 1. no response slots → 202 Accepted
//! 2. one slot, null (a notification) → 202 Accepted
//! 3. one slot → 200, `application/json`, the envelope as the body
//! 4. several slots → 200, `text/event-stream`, one SSE event per non-null
//!    envelope; all-null degrades to 202
//!
//! The transport forces the protocol-version floor that introduced it, so
//! older clients get steered to a compatible revision during `initialize`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use dashmap::DashMap;
use http::{header, HeaderMap, StatusCode};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::RuntimeError;
use crate::jsonrpc::JsonRpcResponse;
use crate::protocol::version::MINIMAL_FOR_STREAMABLE_HTTP;
use crate::protocol::{Implementation, ServerCapabilities};
use crate::server::{McpServer, ServerOptions};
use crate::session::{RequestContext, SessionManager};

use super::sse_event::SseEvent;
use super::{encode_response, Transport};

/// Session header on requests and responses, canonically spelled
/// `Mcp-Session-Id` on the wire. Header names are case-insensitive; the
/// constant is lowercase because that is the only form `http` accepts for
/// static header names.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Where the endpoint listens.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for HttpEndpoint {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            path: "/mcp".to_string(),
        }
    }
}

impl HttpEndpoint {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The streamable HTTP transport.
pub struct StreamableHttpTransport {
    endpoint: HttpEndpoint,
    session_manager: Arc<SessionManager>,
    shutting_down: CancellationToken,
    stopped: CancellationToken,
}

impl StreamableHttpTransport {
    pub fn new() -> Self {
        Self::with_endpoint(HttpEndpoint::default())
    }

    pub fn with_endpoint(endpoint: HttpEndpoint) -> Self {
        Self {
            endpoint,
            session_manager: Arc::new(SessionManager::new()),
            shutting_down: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    /// Builds the axum router serving this transport, for `run` or for
    /// mounting the endpoint into an existing application.
    pub fn router(
        &self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Router {
        // Steer clients below the revision that introduced this transport.
        let options = options.minimum_protocol_version(MINIMAL_FOR_STREAMABLE_HTTP);
        let state = Arc::new(HttpState {
            servers: DashMap::new(),
            session_manager: self.session_manager.clone(),
            capabilities,
            server_info,
            options,
            shutting_down: self.shutting_down.clone(),
        });
        Router::new()
            .route(&self.endpoint.path, post(post_handler).delete(delete_handler))
            .with_state(state)
    }
}

impl Default for StreamableHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StreamableHttpTransport {
    async fn run(
        &self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Result<(), RuntimeError> {
        let app = self.router(capabilities, server_info, options);
        let listener = TcpListener::bind(self.endpoint.bind_addr()).await?;
        tracing::info!(
            addr = %self.endpoint.bind_addr(),
            path = %self.endpoint.path,
            "streamable HTTP transport listening"
        );

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

struct HttpState {
    /// One server instance per live session.
    servers: DashMap<Uuid, Arc<McpServer>>,
    session_manager: Arc<SessionManager>,
    capabilities: ServerCapabilities,
    server_info: Implementation,
    options: ServerOptions,
    shutting_down: CancellationToken,
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

async fn post_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (session_id, server) = match session_header(&headers) {
        Some(raw) => {
            let Ok(session_id) = Uuid::parse_str(raw) else {
                // Malformed ids are indistinguishable from unknown sessions
                // to the client, hence 404 rather than 400.
                return (StatusCode::NOT_FOUND, "Wrong session id format, expected UUID")
                    .into_response();
            };
            let Some(server) = state
                .servers
                .get(&session_id)
                .map(|entry| entry.value().clone())
            else {
                return (
                    StatusCode::NOT_FOUND,
                    "Requested session id not found in session store",
                )
                    .into_response();
            };
            (session_id, server)
        }
        None => {
            let session_id = Uuid::new_v4();
            let server = Arc::new(McpServer::new(
                state.capabilities.clone(),
                state.server_info.clone(),
                state.options.clone(),
            ));
            state.servers.insert(session_id, server.clone());
            tracing::debug!(session_id = %session_id, "created session");
            (session_id, server)
        }
    };

    let session = state.session_manager.resolve_or_create(session_id);
    let ctx = RequestContext::for_session(session)
        .with_shutdown(state.shutting_down.clone())
        .with_cancellation(state.shutting_down.child_token());

    let responses = server.handle_and_get_responses(ctx, &body).await;

    let mut response = build_post_response(&responses);
    if let Ok(value) = header::HeaderValue::from_str(&session_id.to_string()) {
        response.headers_mut().insert(MCP_SESSION_ID_HEADER, value);
    }
    response
}

fn build_post_response(responses: &[Option<JsonRpcResponse>]) -> Response {
    match responses {
        [] | [None] => StatusCode::ACCEPTED.into_response(),
        [Some(single)] => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            encode_response(single),
        )
            .into_response(),
        many => {
            // Several responses are framed as an event stream, one event per
            // envelope; correlation is by id, not position.
            let mut body = String::new();
            let mut wrote_any = false;
            for response in many.iter().flatten() {
                let event = SseEvent::new(encode_response(response));
                if let Err(e) = event.marshal_to(&mut body) {
                    tracing::error!(error = %e, "failed encoding SSE event");
                    continue;
                }
                wrote_any = true;
            }
            if !wrote_any {
                return StatusCode::ACCEPTED.into_response();
            }
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/event-stream")],
                body,
            )
                .into_response()
        }
    }
}

async fn delete_handler(State(state): State<Arc<HttpState>>, headers: HeaderMap) -> Response {
    let Some(raw) = session_header(&headers) else {
        return (StatusCode::BAD_REQUEST, "Mcp-Session-Id header is required").into_response();
    };
    let Ok(session_id) = Uuid::parse_str(raw) else {
        return (StatusCode::BAD_REQUEST, "Wrong session id format, expected UUID")
            .into_response();
    };
    if state.servers.remove(&session_id).is_none() {
        return (
            StatusCode::NOT_FOUND,
            "Requested session id not found in session store",
        )
            .into_response();
    }
    state.session_manager.delete(session_id);
    tracing::debug!(session_id = %session_id, "terminated session");
    StatusCode::NO_CONTENT.into_response()
}
