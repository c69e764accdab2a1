//! MCP message schema: typed requests, results, capabilities, and versions.
//!
//! This is the bridge between the generic JSON-RPC layer and MCP method
//! semantics: every request and notification shape implements
//! [`crate::jsonrpc::Request`], binding it to its wire method name.

pub mod capability;
pub mod requests;
pub mod results;
pub mod version;

pub use capability::{ClientCapabilities, ServerCapabilities};
pub use requests::*;
pub use results::*;
pub use version::{ProtocolVersion, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};

use serde::{Deserialize, Serialize};

/// Name and version of an MCP implementation, exchanged during `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implementation_round_trip() {
        let info = Implementation::new("TestServer", "0.0.0");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"name":"TestServer","version":"0.0.0"}"#);
        let back: Implementation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
