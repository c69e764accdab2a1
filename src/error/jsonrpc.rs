//! JSON-RPC 2.0 wire error object and the standard error codes.
//!
//! The error object is embedded in error envelopes and follows the JSON-RPC
//! 2.0 specification: `code` is an integer, `message` a short human-readable
//! string, `data` an optional value carrying diagnostic detail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// Lower bound of the reserved server-error range.
pub const SERVER_ERROR_RANGE_START: i32 = -32099;
/// Upper bound of the reserved server-error range.
pub const SERVER_ERROR_RANGE_END: i32 = -32000;

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code (standard or application-defined).
    pub code: i32,

    /// Human-readable error message.
    pub message: String,

    /// Additional error data (optional, often a diagnostic string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Creates an error with an arbitrary code and message.
    pub fn new(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// `-32700 Parse error` with a diagnostic string in `data`.
    pub fn parse_error(data: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, "Parse error", Some(Value::String(data.into())))
    }

    /// `-32600 Invalid Request` with a diagnostic string in `data`.
    pub fn invalid_request(data: impl Into<String>) -> Self {
        Self::new(
            INVALID_REQUEST,
            "Invalid Request",
            Some(Value::String(data.into())),
        )
    }

    /// `-32601 Method not found` with a diagnostic string in `data`.
    pub fn method_not_found(data: impl Into<String>) -> Self {
        Self::new(
            METHOD_NOT_FOUND,
            "Method not found",
            Some(Value::String(data.into())),
        )
    }

    /// `-32602 Invalid params` with a diagnostic string in `data`.
    pub fn invalid_params(data: impl Into<String>) -> Self {
        Self::new(
            INVALID_PARAMS,
            "Invalid params",
            Some(Value::String(data.into())),
        )
    }

    /// `-32603 Internal error` with a diagnostic string in `data`.
    pub fn internal_error(data: impl Into<String>) -> Self {
        Self::new(
            INTERNAL_ERROR,
            "Internal error",
            Some(Value::String(data.into())),
        )
    }

    /// Server error in the reserved `[-32099, -32000]` range.
    ///
    /// # Panics
    ///
    /// Panics if `code` falls outside the reserved range; passing a code from
    /// outside it is a programming error caught at registration time, not a
    /// runtime condition.
    pub fn server_error(code: i32, data: impl Into<String>) -> Self {
        assert!(
            (SERVER_ERROR_RANGE_START..=SERVER_ERROR_RANGE_END).contains(&code),
            "server error code must be between -32099 and -32000, but got {code}"
        );
        Self::new(code, "Server error", Some(Value::String(data.into())))
    }

    /// Application error; codes must not collide with the pre-defined range
    /// below `-32000`.
    ///
    /// # Panics
    ///
    /// Panics if `code` is below `-32000` (reserved for the protocol).
    pub fn application_error(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        assert!(
            code >= SERVER_ERROR_RANGE_END,
            "application error code must not be lower than -32000, but got {code}"
        );
        Self::new(code, message, data)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}
