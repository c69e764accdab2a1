//! Error handling for the runtime.
//!
//! Two layers:
//!
//! - [`jsonrpc::JsonRpcError`]: the wire-level error object embedded in
//!   JSON-RPC error envelopes. Errors from handlers are converted into these
//!   by the router and never propagate out of `handle`.
//! - [`RuntimeError`]: host-facing failures such as transport I/O, startup
//!   misconfiguration, encode failures. These are what `run`/`shutdown`
//!   return to the embedding application.

pub mod jsonrpc;

pub use jsonrpc::JsonRpcError;

use thiserror::Error;

/// Failures surfaced to the embedding application.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No transport was configured before `run`; fail-fast at startup.
    #[error("no transport specified, set one with ServerBuilder::with_transport")]
    NoTransport,

    /// Transport-level I/O failure (bind, accept, read, write).
    #[error("transport i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be encoded or decoded outside the JSON-RPC
    /// error-envelope path.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_transport_message() {
        let message = RuntimeError::NoTransport.to_string();
        assert!(message.contains("no transport"));
        assert!(message.contains("with_transport"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "already bound");
        let error: RuntimeError = io.into();
        assert!(matches!(error, RuntimeError::Io(_)));
        assert!(error.to_string().contains("already bound"));
    }
}
