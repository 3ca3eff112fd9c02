//! Resource Registry
//!
//! Manages registration and lookup of MCP resource handlers.

use std::sync::Arc;

use crate::error::{Result, ServerError};
use crate::mcp::protocol::{ResourceContent, ResourceDefinition};
use crate::ports::{ResourceHandler, ToolContext};

/// Registry for MCP resource handlers
#[derive(Default)]
pub struct ResourceRegistry {
    handlers: Vec<Arc<dyn ResourceHandler>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a resource handler
    pub fn register(&mut self, handler: Arc<dyn ResourceHandler>) {
        self.handlers.push(handler);
    }

    /// List all available resources from all handlers
    ///
    /// # Errors
    ///
    /// Handler failures are logged and skipped; this always returns `Ok`.
    pub async fn list(&self, ctx: &ToolContext) -> Result<Vec<ResourceDefinition>> {
        let mut all_resources = Vec::new();
        for handler in &self.handlers {
            match handler.list(ctx).await {
                Ok(resources) => all_resources.extend(resources),
                Err(e) => {
                    tracing::warn!(
                        scheme = handler.scheme(),
                        error = %e,
                        "Failed to list resources"
                    );
                }
            }
        }
        Ok(all_resources)
    }

    /// Read a resource by URI, routing to the handler for its scheme
    ///
    /// # Errors
    ///
    /// Returns `McpInvalidRequest` when the URI has no scheme or no handler
    /// serves it, or the handler's own error.
    pub async fn read(&self, uri: &str, ctx: &ToolContext) -> Result<Vec<ResourceContent>> {
        let (scheme, _) = uri
            .split_once("://")
            .ok_or_else(|| ServerError::McpInvalidRequest(format!("Invalid URI: {uri}")))?;

        let handler = self
            .handlers
            .iter()
            .find(|h| h.scheme() == scheme)
            .ok_or_else(|| {
                ServerError::McpInvalidRequest(format!("Unsupported resource scheme: {scheme}"))
            })?;

        handler.read(uri, ctx).await
    }

    /// Get the number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Create the default resource registry with all built-in resource handlers
#[must_use]
pub fn create_default_resource_registry() -> ResourceRegistry {
    use super::resources::ArgocdResourceHandler;

    let mut registry = ResourceRegistry::new();
    registry.register(Arc::new(ArgocdResourceHandler));
    registry
}
