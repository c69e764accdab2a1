//! mcp-runtime: server-side runtime for the Model Context Protocol.
//!
//! MCP is a JSON-RPC 2.0 dialect over which an AI assistant invokes tools,
//! reads resources, fetches prompt templates, and negotiates completions on a
//! server. This crate provides the three subsystems such a server is built
//! from, plus the glue that wires user handlers into them:
//!
//! - **JSON-RPC router** ([`jsonrpc`]): batch and single dispatch, dynamic
//!   registration keyed by method name, a fresh typed request per call, and
//!   exact id propagation through every error edge.
//! - **Server core** ([`server`]): the `initialize`/`ping`/`initialized`
//!   lifecycle, protocol-version negotiation, capability advertisement, and
//!   the response fan-out channel transports drain.
//! - **Transports** ([`transport`]): process-local stdio (newline-delimited
//!   JSON), streamable HTTP (per-session servers behind an `Mcp-Session-Id`
//!   header, batch promotion to `text/event-stream`), and the legacy SSE
//!   endpoint pair.
//!
//! Handlers for the capability kinds a server advertises (tools, prompts,
//! resources, completions) are collected by the [`registry`] layer and wired
//! through [`builder::ServerBuilder`]:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mcp_runtime::builder::ServerBuilder;
//! use mcp_runtime::transport::stdio::StdioTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mcp_runtime::RuntimeError> {
//!     ServerBuilder::new()
//!         .with_name("my-server")
//!         .with_version("0.1.0")
//!         .with_tool(MyTool)
//!         .with_transport(Arc::new(StdioTransport::new()))
//!         .run()
//!         .await
//! }
//! ```
//!
//! Sessions are process-local ([`session`]); nothing survives a restart, and
//! the runtime neither authenticates clients nor retries upstream calls.

pub mod builder;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod transport;

pub use builder::ServerBuilder;
pub use error::{JsonRpcError, RuntimeError};
pub use jsonrpc::{JsonRpcResponse, RequestId};
pub use protocol::{Implementation, ServerCapabilities};
pub use server::{McpServer, ServerOptions};
pub use session::{RequestContext, Session, SessionManager};
pub use transport::Transport;
