//! Ports module - Trait definitions for hexagonal architecture
//!
//! The traits here are the boundaries between the tool layer and its
//! adapters: the ArgoCD transport, tool handlers and resource handlers.

mod argocd;
pub mod protocol;
mod resources;
mod tools;

pub use argocd::{ApiRequest, ArgocdApi, HttpMethod};
pub use protocol::{
    ResourceContent, ResourceDefinition, ToolAnnotations, ToolCallResult, ToolContent,
};
pub use resources::ResourceHandler;
pub use tools::{ClientSet, ToolContext, ToolHandler, ToolSchema};

#[cfg(test)]
pub use argocd::mock::MockArgocdApi;

#[cfg(test)]
pub use tools::mock;
