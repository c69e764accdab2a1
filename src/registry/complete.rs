//! Completion routing: `completion/complete` dispatched by reference kind.

use std::sync::Arc;

use crate::error::JsonRpcError;
use crate::protocol::requests::{CompleteRequest, CompletionReference};
use crate::protocol::results::CompleteResult;
use crate::server::McpServer;
use crate::session::RequestContext;

use super::prompts::PromptRegistry;
use super::resources::ResourceRegistry;
use super::{RegistryError, COMPLETE_FAILED_CODE};

/// Routes completion requests to the registry that owns the reference:
/// `ref/prompt` to the prompt registry, `ref/resource` to the resource
/// registry. Unknown reference kinds never get here, they fail decoding.
pub struct CompletionRouter {
    prompts: Arc<PromptRegistry>,
    resources: Arc<ResourceRegistry>,
}

impl CompletionRouter {
    pub fn new(prompts: Arc<PromptRegistry>, resources: Arc<ResourceRegistry>) -> Self {
        Self { prompts, resources }
    }

    pub async fn complete(
        &self,
        ctx: &RequestContext,
        request: &CompleteRequest,
    ) -> Result<CompleteResult, RegistryError> {
        match &request.params.reference {
            CompletionReference::Prompt { name } => {
                self.prompts
                    .complete(ctx, name, &request.params.argument)
                    .await
            }
            CompletionReference::Resource { uri } => {
                self.resources
                    .complete(ctx, uri, &request.params.argument)
                    .await
            }
        }
    }

    /// Attaches the `completion/complete` handler to `server`.
    pub fn register_handlers(self: Arc<Self>, server: &mut McpServer) {
        let router = self;
        server.set_request_handler(move |ctx, request: CompleteRequest| {
            let router = router.clone();
            async move {
                router.complete(&ctx, &request).await.map_err(|e| {
                    JsonRpcError::server_error(
                        COMPLETE_FAILED_CODE,
                        format!("failed to complete: {e}"),
                    )
                })
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::results::{PromptArgument, GetPromptResult};
    use crate::protocol::requests::GetPromptRequest;
    use async_trait::async_trait;
    use serde_json::json;

    struct NamedPrompt;

    #[async_trait]
    impl crate::registry::Prompt for NamedPrompt {
        fn definition(&self) -> crate::protocol::results::Prompt {
            crate::protocol::results::Prompt {
                name: "named".to_string(),
                description: None,
                arguments: Some(vec![PromptArgument {
                    name: "value".to_string(),
                    description: None,
                    required: None,
                }]),
            }
        }

        async fn get(
            &self,
            _ctx: &RequestContext,
            _request: &GetPromptRequest,
        ) -> Result<GetPromptResult, RegistryError> {
            Ok(GetPromptResult {
                description: None,
                messages: vec![],
            })
        }
    }

    fn router() -> Arc<CompletionRouter> {
        let prompts = Arc::new(PromptRegistry::new(vec![Arc::new(NamedPrompt)]));
        let resources = Arc::new(ResourceRegistry::new(vec![], vec![]));
        Arc::new(CompletionRouter::new(prompts, resources))
    }

    fn complete_request(reference: serde_json::Value) -> CompleteRequest {
        serde_json::from_value(json!({
            "method": "completion/complete",
            "params": {
                "ref": reference,
                "argument": {"name": "value", "value": ""}
            },
            "id": 1
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_prompt_reference_routes_to_prompts() {
        let request = complete_request(json!({"type": "ref/prompt", "name": "named"}));
        let result = router()
            .complete(&RequestContext::new(), &request)
            .await
            .unwrap();
        assert_eq!(result.completion.total, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_prompt_is_error() {
        let request = complete_request(json!({"type": "ref/prompt", "name": "missing"}));
        let result = router().complete(&RequestContext::new(), &request).await;
        assert!(matches!(result, Err(RegistryError::PromptNotFound { .. })));
    }

    #[tokio::test]
    async fn test_resource_reference_routes_to_resources() {
        let request = complete_request(json!({"type": "ref/resource", "uri": "file:///{p}"}));
        let result = router()
            .complete(&RequestContext::new(), &request)
            .await
            .unwrap();
        assert!(result.completion.values.is_empty());
    }
}
