//! Resource registry: static resources, dynamic providers, and templates.
//!
//! Static resources are indexed by URI. Providers contribute resources that
//! are not known until list time (directory contents, cluster objects, …)
//! and get a chance to serve reads the static table cannot; a provider
//! returning `Ok(None)` from `read` means "not mine, ask the next one".

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::JsonRpcError;
use crate::protocol::requests::{
    CompletionArgument, ListResourceTemplatesRequest, ListResourcesRequest, ReadResourceRequest,
};
use crate::protocol::results::{
    CompleteResult, ListResourceTemplatesResult, ListResourcesResult, ReadResourceResult,
    ResourceTemplate,
};
use crate::server::McpServer;
use crate::session::RequestContext;

use super::{RegistryError, LIST_RESOURCES_FAILED_CODE, READ_RESOURCE_FAILED_CODE};

/// A single resource with a fixed URI.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// The descriptor advertised via `resources/list`; its `uri` is the
    /// dispatch key.
    fn definition(&self) -> crate::protocol::results::Resource;

    /// Reads the resource contents.
    async fn read(
        &self,
        ctx: &RequestContext,
        uri: &str,
    ) -> Result<ReadResourceResult, RegistryError>;
}

/// A source of dynamically discovered resources.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Resources currently available from this provider.
    async fn list(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<crate::protocol::results::Resource>, RegistryError>;

    /// Reads a resource if this provider owns the URI; `Ok(None)` passes.
    async fn read(
        &self,
        ctx: &RequestContext,
        uri: &str,
    ) -> Result<Option<ReadResourceResult>, RegistryError>;

    /// URI templates this provider understands. Default: none.
    async fn templates(
        &self,
        _ctx: &RequestContext,
    ) -> Result<Vec<ResourceTemplate>, RegistryError> {
        Ok(Vec::new())
    }
}

/// URI-indexed static resources plus ordered providers.
pub struct ResourceRegistry {
    resources: HashMap<String, Arc<dyn ResourceReader>>,
    providers: Vec<Arc<dyn ResourceProvider>>,
}

impl ResourceRegistry {
    pub fn new(
        resources: Vec<Arc<dyn ResourceReader>>,
        providers: Vec<Arc<dyn ResourceProvider>>,
    ) -> Self {
        let resources = resources
            .into_iter()
            .map(|resource| (resource.definition().uri.clone(), resource))
            .collect();
        Self {
            resources,
            providers,
        }
    }

    /// All advertised resources: statics (sorted by URI) then provider
    /// contributions in provider order.
    pub async fn list(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<crate::protocol::results::Resource>, RegistryError> {
        let mut listed: Vec<_> = self
            .resources
            .values()
            .map(|resource| resource.definition())
            .collect();
        listed.sort_by(|a, b| a.uri.cmp(&b.uri));

        for provider in &self.providers {
            listed.extend(provider.list(ctx).await?);
        }
        Ok(listed)
    }

    /// Reads a URI: static table first, then providers in order. A URI
    /// nobody owns reads as empty contents rather than an error.
    pub async fn read(
        &self,
        ctx: &RequestContext,
        uri: &str,
    ) -> Result<ReadResourceResult, RegistryError> {
        if let Some(resource) = self.resources.get(uri) {
            return resource.read(ctx, uri).await;
        }
        for provider in &self.providers {
            if let Some(result) = provider.read(ctx, uri).await? {
                return Ok(result);
            }
        }
        Ok(ReadResourceResult::default())
    }

    /// Templates contributed by providers.
    pub async fn templates(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<ResourceTemplate>, RegistryError> {
        let mut templates = Vec::new();
        for provider in &self.providers {
            templates.extend(provider.templates(ctx).await?);
        }
        Ok(templates)
    }

    /// Completes a resource-URI reference.
    pub async fn complete(
        &self,
        _ctx: &RequestContext,
        _uri: &str,
        _argument: &CompletionArgument,
    ) -> Result<CompleteResult, RegistryError> {
        // TODO: match the URI against provider templates once URI-template
        // expansion is implemented; until then nothing can be suggested.
        Ok(CompleteResult::empty())
    }

    /// Attaches `resources/list`, `resources/read`, and
    /// `resources/templates/list` handlers to `server`.
    pub fn register_handlers(self: Arc<Self>, server: &mut McpServer) {
        let registry = self.clone();
        server.set_request_handler(move |ctx, _request: ListResourcesRequest| {
            let registry = registry.clone();
            async move {
                let resources = registry.list(&ctx).await.map_err(|e| {
                    JsonRpcError::server_error(
                        LIST_RESOURCES_FAILED_CODE,
                        format!("failed to get resources: {e}"),
                    )
                })?;
                Ok(ListResourcesResult {
                    resources,
                    next_cursor: None,
                })
            }
        });

        let registry = self.clone();
        server.set_request_handler(move |ctx, request: ReadResourceRequest| {
            let registry = registry.clone();
            async move {
                registry
                    .read(&ctx, &request.params.uri)
                    .await
                    .map_err(|e| {
                        JsonRpcError::server_error(
                            READ_RESOURCE_FAILED_CODE,
                            format!("failed to read resource: {e}"),
                        )
                    })
            }
        });

        let registry = self;
        server.set_request_handler(move |ctx, _request: ListResourceTemplatesRequest| {
            let registry = registry.clone();
            async move {
                let resource_templates = registry.templates(&ctx).await.map_err(|e| {
                    JsonRpcError::server_error(
                        LIST_RESOURCES_FAILED_CODE,
                        format!("failed to get resource templates: {e}"),
                    )
                })?;
                Ok(ListResourceTemplatesResult {
                    resource_templates,
                    next_cursor: None,
                })
            }
        });
    }
}
