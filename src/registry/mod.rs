//! Handler registries for the capability kinds a server advertises.
//!
//! Each registry indexes user-supplied handlers by name and knows how to
//! attach the corresponding request handlers to a server; the builder runs
//! that attachment against every server instance a transport creates.
//! Registry failures surface as JSON-RPC server errors with the codes below.

pub mod complete;
pub mod prompts;
pub mod resources;
pub mod tools;

pub use complete::CompletionRouter;
pub use prompts::{Prompt, PromptRegistry};
pub use resources::{ResourceProvider, ResourceReader, ResourceRegistry};
pub use tools::{Tool, ToolRegistry};

use thiserror::Error;

/// `tools/call` named a tool this server does not have.
pub const TOOL_NOT_FOUND_CODE: i32 = -32000;
/// `prompts/get` failed (unknown prompt or render failure).
pub const GET_PROMPT_FAILED_CODE: i32 = -32001;
/// A resource provider failed while listing.
pub const LIST_RESOURCES_FAILED_CODE: i32 = -32002;
/// `resources/read` failed.
pub const READ_RESOURCE_FAILED_CODE: i32 = -32003;
/// `completion/complete` failed.
pub const COMPLETE_FAILED_CODE: i32 = -32004;

/// Failures produced by the registry layer.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("prompt not found: {name}")]
    PromptNotFound { name: String },

    #[error("no such argument to complete for prompt: '{name}'")]
    NoSuchArgument { name: String },

    /// A user handler (prompt render, resource read, provider) failed.
    #[error("{reason}")]
    Handler { reason: String },
}

impl RegistryError {
    /// Wraps an arbitrary handler failure.
    pub fn handler(reason: impl Into<String>) -> Self {
        Self::Handler {
            reason: reason.into(),
        }
    }
}
