pub mod argocd;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod ports;
pub mod security;

pub use config::Config;
pub use error::{Result, ServerError};
pub use mcp::McpServer;
pub use ports::{ArgocdApi, ToolAnnotations, ToolContext, ToolHandler, ToolSchema};
pub use security::{
    AuditLogger, ConfirmationRequired, OperationBlocked, RateLimiter, SafetyDenial, SafetyGuard,
    Sanitizer,
};
