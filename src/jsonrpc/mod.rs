//! JSON-RPC 2.0 framing: request ids, envelopes, and the typed-request trait.
//!
//! # Id preservation
//!
//! The id type (string or integer) sent by a client MUST be preserved in the
//! response; never coerce between types. A request whose `id` field is absent
//! is a notification and produces no response at all; [`RequestId::Missing`]
//! exists to carry that state through dispatch and refuses to serialize.

pub mod router;

pub use router::JsonRpcRouter;

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::jsonrpc::JsonRpcError;

/// The only accepted value of the `jsonrpc` field.
pub const JSONRPC_VERSION: &str = "2.0";

/// A typed request bound to a wire method name.
///
/// Implemented by every MCP request and notification shape; the router uses
/// the binding to materialize a fresh instance per dispatch by deserializing
/// the raw envelope into `Self`.
pub trait Request: DeserializeOwned + Send + 'static {
    /// Wire method name this request type binds to.
    const METHOD: &'static str;
}

/// JSON-RPC 2.0 request id, preserving the exact wire variant.
///
/// Four states rather than three: an explicit `null` id is only ever *sent*
/// by the server in error envelopes where no id could be recovered, while a
/// missing id marks a notification and must never appear in any envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RequestId {
    /// Integer id (e.g. `"id": 1`).
    Number(i64),
    /// String id (e.g. `"id": "abc-123"`).
    String(String),
    /// Explicit `null`, used in error envelopes for unrecoverable ids.
    Null,
    /// The `id` field was absent: a notification.
    #[default]
    Missing,
}

impl RequestId {
    /// Returns true if the id field was absent from the request.
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, RequestId::Missing)
    }

    /// Replaces the missing variant with an explicit null.
    ///
    /// Error envelopes must always carry an id field; this is the only
    /// sanctioned escape hatch for reporting failures on id-less messages.
    pub fn or_null(self) -> Self {
        match self {
            RequestId::Missing => RequestId::Null,
            other => other,
        }
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RequestId::Number(n) => serializer.serialize_i64(*n),
            RequestId::String(s) => serializer.serialize_str(s),
            RequestId::Null => serializer.serialize_unit(),
            RequestId::Missing => Err(serde::ser::Error::custom(
                "id is missing and is not supposed to be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Number(n) => n.as_i64().map(RequestId::Number).ok_or_else(|| {
                serde::de::Error::custom("JSON-RPC id must be an integer, not a float")
            }),
            Value::String(s) => Ok(RequestId::String(s)),
            Value::Null => Ok(RequestId::Null),
            _ => Err(serde::de::Error::custom(
                "JSON-RPC id must be a string, integer, or null",
            )),
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Null => write!(f, "null"),
            RequestId::Missing => write!(f, "<missing>"),
        }
    }
}

/// Outbound JSON-RPC 2.0 envelope: either a result or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    /// Id echoed from the request (null when unrecoverable).
    pub id: RequestId,
    /// Result payload (success envelopes).
    pub result: Option<Value>,
    /// Error object (error envelopes).
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Creates a success envelope.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error envelope.
    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl Serialize for JsonRpcResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.id.is_missing() {
            return Err(serde::ser::Error::custom(
                "id is missing, this is not supposed to be marshaled",
            ));
        }
        let mut envelope = serializer.serialize_struct("JsonRpcResponse", 3)?;
        envelope.serialize_field("jsonrpc", JSONRPC_VERSION)?;
        match &self.error {
            Some(error) => envelope.serialize_field("error", error)?,
            None => {
                envelope.serialize_field("result", self.result.as_ref().unwrap_or(&Value::Null))?
            }
        }
        envelope.serialize_field("id", &self.id)?;
        envelope.end()
    }
}

impl<'de> Deserialize<'de> for JsonRpcResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let object = value
            .as_object()
            .ok_or_else(|| serde::de::Error::custom("response must be a JSON object"))?;
        let id = match object.get("id") {
            None => RequestId::Missing,
            Some(id) => RequestId::deserialize(id).map_err(serde::de::Error::custom)?,
        };
        let error = object
            .get("error")
            .map(|e| JsonRpcError::deserialize(e).map_err(serde::de::Error::custom))
            .transpose()?;
        let result = match error {
            Some(_) => None,
            None => object.get("result").cloned(),
        };
        Ok(Self { id, result, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_id_preserved() {
        let response = JsonRpcResponse::success(RequestId::Number(42), json!({}));
        let serialized = serde_json::to_string(&response).unwrap();
        assert!(serialized.contains("\"id\":42"));
        assert!(!serialized.contains("\"id\":\"42\""));
    }

    #[test]
    fn test_string_id_preserved() {
        let response = JsonRpcResponse::success(RequestId::String("abc-123".into()), json!({}));
        let serialized = serde_json::to_string(&response).unwrap();
        assert!(serialized.contains("\"id\":\"abc-123\""));
    }

    #[test]
    fn test_null_id_serialized_as_null() {
        let response = JsonRpcResponse::error(
            RequestId::Null,
            JsonRpcError::parse_error("not valid json"),
        );
        let serialized = serde_json::to_string(&response).unwrap();
        assert!(serialized.contains("\"id\":null"));
    }

    #[test]
    fn test_missing_id_refuses_to_serialize() {
        let response = JsonRpcResponse::success(RequestId::Missing, json!({}));
        assert!(serde_json::to_string(&response).is_err());
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = JsonRpcResponse::success(RequestId::Number(0), json!({}));
        let serialized = serde_json::to_string(&response).unwrap();
        assert_eq!(serialized, r#"{"jsonrpc":"2.0","result":{},"id":0}"#);
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = JsonRpcResponse::error(
            RequestId::Number(1),
            JsonRpcError::method_not_found("request for method unknown not found in registry"),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["id"], 1);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_envelope_round_trip() {
        let response = JsonRpcResponse::success(
            RequestId::String("r-1".into()),
            json!({"resources": [{"name": "resource1", "uri": "uri1"}]}),
        );
        let serialized = serde_json::to_string(&response).unwrap();
        let back: JsonRpcResponse = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, response);
        let reserialized = serde_json::to_string(&back).unwrap();
        assert_eq!(reserialized, serialized);
    }

    #[test]
    fn test_float_id_rejected_on_decode() {
        let result: Result<RequestId, _> = serde_json::from_str("1.5");
        assert!(result.is_err());
    }

    #[test]
    fn test_or_null() {
        assert_eq!(RequestId::Missing.or_null(), RequestId::Null);
        assert_eq!(RequestId::Number(7).or_null(), RequestId::Number(7));
    }
}
