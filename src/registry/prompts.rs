//! Prompt registry: `prompts/list`, `prompts/get`, and per-argument
//! completion.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::JsonRpcError;
use crate::protocol::requests::{
    CompletionArgument, GetPromptRequest, ListPromptsRequest,
};
use crate::protocol::results::{CompleteResult, GetPromptResult, ListPromptsResult};
use crate::server::McpServer;
use crate::session::RequestContext;

use super::{RegistryError, GET_PROMPT_FAILED_CODE};

/// A prompt template the server can render.
#[async_trait]
pub trait Prompt: Send + Sync {
    /// The descriptor advertised via `prompts/list`; its `name` is the
    /// dispatch key.
    fn definition(&self) -> crate::protocol::results::Prompt;

    /// Renders the prompt for the given request.
    async fn get(
        &self,
        ctx: &RequestContext,
        request: &GetPromptRequest,
    ) -> Result<GetPromptResult, RegistryError>;

    /// Completes one of the prompt's declared arguments.
    ///
    /// The default declines arguments the descriptor does not declare and
    /// answers declared ones with the empty completion; prompts with real
    /// suggestions override this.
    async fn complete(
        &self,
        _ctx: &RequestContext,
        argument: &CompletionArgument,
    ) -> Result<CompleteResult, RegistryError> {
        let definition = self.definition();
        let declared = definition
            .arguments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|declared| declared.name == argument.name);
        if !declared {
            return Err(RegistryError::NoSuchArgument {
                name: argument.name.clone(),
            });
        }
        Ok(CompleteResult::empty())
    }
}

/// Name-indexed set of prompts.
pub struct PromptRegistry {
    prompts: HashMap<String, Arc<dyn Prompt>>,
}

impl PromptRegistry {
    pub fn new(prompts: Vec<Arc<dyn Prompt>>) -> Self {
        let prompts = prompts
            .into_iter()
            .map(|prompt| (prompt.definition().name.clone(), prompt))
            .collect();
        Self { prompts }
    }

    /// Advertised descriptors, sorted by name for stable listings.
    pub fn definitions(&self) -> Vec<crate::protocol::results::Prompt> {
        let mut definitions: Vec<_> = self
            .prompts
            .values()
            .map(|prompt| prompt.definition())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Renders the prompt named in the request.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        request: &GetPromptRequest,
    ) -> Result<GetPromptResult, RegistryError> {
        let prompt = self.prompts.get(&request.params.name).ok_or_else(|| {
            RegistryError::PromptNotFound {
                name: request.params.name.clone(),
            }
        })?;
        prompt.get(ctx, request).await
    }

    /// Completes an argument of the named prompt.
    pub async fn complete(
        &self,
        ctx: &RequestContext,
        name: &str,
        argument: &CompletionArgument,
    ) -> Result<CompleteResult, RegistryError> {
        let prompt = self
            .prompts
            .get(name)
            .ok_or_else(|| RegistryError::PromptNotFound {
                name: name.to_string(),
            })?;
        prompt.complete(ctx, argument).await
    }

    /// Attaches `prompts/list` and `prompts/get` handlers to `server`.
    pub fn register_handlers(self: Arc<Self>, server: &mut McpServer) {
        let registry = self.clone();
        server.set_request_handler(move |_ctx, _request: ListPromptsRequest| {
            let prompts = registry.definitions();
            std::future::ready(Ok(ListPromptsResult {
                prompts,
                next_cursor: None,
            }))
        });

        let registry = self;
        server.set_request_handler(move |ctx, request: GetPromptRequest| {
            let registry = registry.clone();
            async move {
                registry.get(&ctx, &request).await.map_err(|e| {
                    JsonRpcError::server_error(
                        GET_PROMPT_FAILED_CODE,
                        format!("failed to get prompt: {e}"),
                    )
                })
            }
        });
    }
}
