//! Transports: the network edge of the runtime.
//!
//! A transport owns the session lifecycle and bridges bytes to the server:
//! it reads frames, hands them to [`McpServer::handle`] (or
//! `handle_and_get_responses`), and delivers envelopes back to the peer.
//! Three implementations ship here: [`stdio`], [`streamable_http`], and the
//! legacy [`sse`] endpoint pair.

pub mod sse;
pub mod sse_event;
pub mod stdio;
pub mod streamable_http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RuntimeError;
use crate::jsonrpc::JsonRpcResponse;
use crate::protocol::{Implementation, ServerCapabilities};
use crate::server::ServerOptions;
use crate::session::SessionManager;

/// A server transport.
///
/// `run` serves until shutdown is requested or the peer goes away; `shutdown`
/// asks it to stop and resolves once both directions have confirmed exit
/// (wrap it in [`tokio::time::timeout`] for a hard deadline).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Serves MCP over this transport, creating server instances advertising
    /// `capabilities` and `server_info` configured by `options`.
    async fn run(
        &self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Result<(), RuntimeError>;

    /// Initiates shutdown (idempotent) and waits for the transport to stop.
    async fn shutdown(&self) -> Result<(), RuntimeError>;

    /// The session table owned by this transport.
    fn session_manager(&self) -> Arc<SessionManager>;
}

/// Encodes one envelope to its wire JSON.
///
/// Encoding an envelope can only fail when its id is the never-serialized
/// missing variant; per the error-propagation policy the failure is logged
/// and replaced by a `-32000` server error preserving the id (null when the
/// original is unrecoverable).
pub(crate) fn encode_response(response: &JsonRpcResponse) -> String {
    match serde_json::to_string(response) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response envelope");
            let fallback = JsonRpcResponse::error(
                response.id.clone().or_null(),
                crate::error::JsonRpcError::server_error(-32000, e.to_string()),
            );
            serde_json::to_string(&fallback).unwrap_or_else(|_| {
                r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#
                    .to_string()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonRpcError;
    use crate::jsonrpc::RequestId;
    use serde_json::json;

    #[test]
    fn test_encode_success_envelope() {
        let response = JsonRpcResponse::success(RequestId::Number(1), json!({}));
        assert_eq!(
            encode_response(&response),
            r#"{"jsonrpc":"2.0","result":{},"id":1}"#
        );
    }

    #[test]
    fn test_encode_missing_id_degrades_to_server_error() {
        let response = JsonRpcResponse::success(RequestId::Missing, json!({}));
        let encoded = encode_response(&response);
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["id"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], -32000);
    }

    #[test]
    fn test_encode_error_envelope_preserves_id() {
        let response = JsonRpcResponse::error(
            RequestId::String("s-1".into()),
            JsonRpcError::method_not_found("nope"),
        );
        let value: serde_json::Value =
            serde_json::from_str(&encode_response(&response)).unwrap();
        assert_eq!(value["id"], "s-1");
        assert_eq!(value["error"]["code"], -32601);
    }
}
