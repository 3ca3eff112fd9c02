//! ArgoCD Resource Handler
//!
//! URI format: `argocd://{instances|security}`

use async_trait::async_trait;

use super::{instances_resource, security_resource};
use crate::error::{Result, ServerError};
use crate::mcp::protocol::{ResourceContent, ResourceDefinition};
use crate::ports::{ResourceHandler, ToolContext};

/// Resource handler for the server's instance and security configuration
pub struct ArgocdResourceHandler;

#[async_trait]
impl ResourceHandler for ArgocdResourceHandler {
    fn scheme(&self) -> &'static str {
        "argocd"
    }

    fn description(&self) -> &'static str {
        "ArgoCD MCP server configuration"
    }

    async fn list(&self, _ctx: &ToolContext) -> Result<Vec<ResourceDefinition>> {
        Ok(vec![
            ResourceDefinition {
                uri: instances_resource::INSTANCES_URI.to_string(),
                name: "ArgoCD instances".to_string(),
                description: Some("Configured ArgoCD instances and their URLs".to_string()),
                mime_type: Some("text/plain".to_string()),
            },
            ResourceDefinition {
                uri: security_resource::SECURITY_URI.to_string(),
                name: "Security settings".to_string(),
                description: Some(
                    "Read-only, destructive, single-cluster and rate limit settings".to_string(),
                ),
                mime_type: Some("text/plain".to_string()),
            },
        ])
    }

    async fn read(&self, uri: &str, ctx: &ToolContext) -> Result<Vec<ResourceContent>> {
        let text = match uri {
            instances_resource::INSTANCES_URI => instances_resource::render(&ctx.config),
            security_resource::SECURITY_URI => security_resource::render(&ctx.config.security),
            _ => {
                return Err(ServerError::McpInvalidRequest(format!(
                    "Unknown resource: {uri}"
                )));
            }
        };
        Ok(vec![ResourceContent::text(uri, text)])
    }
}
