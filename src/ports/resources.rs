//! Resource Handler Port

use async_trait::async_trait;

use super::protocol::{ResourceContent, ResourceDefinition};
use crate::error::Result;
use crate::ports::ToolContext;

/// Trait for resource handlers
///
/// Each handler serves the URIs of one scheme (e.g. `argocd://`).
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// URI scheme this handler supports
    fn scheme(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Resources that can be listed upfront
    async fn list(&self, ctx: &ToolContext) -> Result<Vec<ResourceDefinition>>;

    /// Read a resource by its full URI (e.g. `argocd://security`)
    async fn read(&self, uri: &str, ctx: &ToolContext) -> Result<Vec<ResourceContent>>;
}
