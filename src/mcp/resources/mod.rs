//! MCP Resource Handlers
//!
//! Read-only views of the server's own configuration, served under the
//! `argocd://` scheme.

mod argocd_resource;
mod instances_resource;
mod security_resource;

pub use argocd_resource::ArgocdResourceHandler;
pub use instances_resource::{INSTANCES_URI, render as render_instances};
pub use security_resource::{SECURITY_URI, render as render_security};
