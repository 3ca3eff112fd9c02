use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid { field: String, reason: String },

    #[error("Unknown instance '{instance}'. Available: [{available}]")]
    UnknownInstance { instance: String, available: String },

    // ArgoCD API errors
    #[error("ArgoCD API error ({code}): {message}{}", details_suffix(.details.as_deref()))]
    Api {
        code: u16,
        message: String,
        details: Option<String>,
    },

    #[error("ArgoCD request failed: {0}")]
    Http(String),

    #[error("ArgoCD request timed out: {0}")]
    Timeout(String),

    // MCP protocol errors
    #[error("MCP invalid request: {0}")]
    McpInvalidRequest(String),

    #[error("MCP missing parameter: {param}")]
    McpMissingParam { param: String },

    #[error("MCP unknown tool: {tool}")]
    McpUnknownTool { tool: String },

    // Audit trail errors
    #[error("Failed to write audit log {path}: {reason}")]
    AuditWrite { path: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn details_suffix(details: Option<&str>) -> String {
    details.map(|d| format!(" - {d}")).unwrap_or_default()
}

impl ServerError {
    /// Whether this error came from talking to the ArgoCD backend
    ///
    /// Tool handlers record these with `log_error` and report them to the
    /// caller as an error result; anything else aborts the tool call.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Http(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
