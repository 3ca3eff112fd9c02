use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Setting names, as exposed through the environment
pub const ENV_READ_ONLY: &str = "MCP_READ_ONLY";
pub const ENV_DISABLE_DESTRUCTIVE: &str = "MCP_DISABLE_DESTRUCTIVE";
pub const ENV_SINGLE_CLUSTER: &str = "MCP_SINGLE_CLUSTER";
pub const ENV_AUDIT_LOG: &str = "MCP_AUDIT_LOG";
pub const ENV_MASK_SECRETS: &str = "MCP_MASK_SECRETS";
pub const ENV_RATE_LIMIT_CALLS: &str = "MCP_RATE_LIMIT_CALLS";
pub const ENV_RATE_LIMIT_WINDOW: &str = "MCP_RATE_LIMIT_WINDOW";

/// Name given to the instance configured through `ARGOCD_URL`
pub const PRIMARY_INSTANCE: &str = "primary";

/// Top-level server configuration
#[derive(Clone)]
pub struct Config {
    pub argocd_url: String,
    pub argocd_token: Zeroizing<String>,
    pub argocd_insecure: bool,

    /// Additional ArgoCD instances for multi-cluster setups
    pub additional_instances: Vec<ArgocdInstance>,

    pub server_name: String,
    pub server_version: String,
    pub log_level: LogLevel,

    pub security: SecurityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            argocd_url: String::new(),
            argocd_token: Zeroizing::new(String::new()),
            argocd_insecure: false,
            additional_instances: Vec::new(),
            server_name: default_server_name(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: LogLevel::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("argocd_url", &self.argocd_url)
            .field("argocd_token", &"***")
            .field("argocd_insecure", &self.argocd_insecure)
            .field("additional_instances", &self.additional_instances)
            .field("server_name", &self.server_name)
            .field("server_version", &self.server_version)
            .field("log_level", &self.log_level)
            .field("security", &self.security)
            .finish()
    }
}

impl Config {
    /// The instance built from `ARGOCD_URL` / `ARGOCD_TOKEN`, if a URL is set
    #[must_use]
    pub fn primary_instance(&self) -> Option<ArgocdInstance> {
        if self.argocd_url.is_empty() {
            return None;
        }
        Some(ArgocdInstance {
            url: normalize_url(&self.argocd_url),
            token: self.argocd_token.clone(),
            name: PRIMARY_INSTANCE.to_string(),
            insecure: self.argocd_insecure,
        })
    }

    /// Primary instance first, followed by the additional ones
    #[must_use]
    pub fn all_instances(&self) -> Vec<ArgocdInstance> {
        self.primary_instance()
            .into_iter()
            .chain(self.additional_instances.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn get_instance(&self, name: &str) -> Option<ArgocdInstance> {
        self.all_instances().into_iter().find(|i| i.name == name)
    }
}

fn default_server_name() -> String {
    "argocd-mcp".to_string()
}

/// One ArgoCD API endpoint
#[derive(Clone, Deserialize, Serialize)]
pub struct ArgocdInstance {
    pub url: String,

    /// API token, erased from memory on drop
    pub token: Zeroizing<String>,

    #[serde(default = "default_instance_name")]
    pub name: String,

    /// Skip TLS verification
    #[serde(default)]
    pub insecure: bool,
}

fn default_instance_name() -> String {
    "default".to_string()
}

impl fmt::Debug for ArgocdInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgocdInstance")
            .field("url", &self.url)
            .field("token", &"***")
            .field("name", &self.name)
            .field("insecure", &self.insecure)
            .finish()
    }
}

/// Prefix `https://` when no scheme is given and drop trailing slashes
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Safety knobs read by the authorization layer
///
/// The defaults fail closed: read-only, destructive operations disabled,
/// secrets masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityConfig {
    /// Block all write operations
    pub read_only: bool,

    /// Block delete and prune operations
    pub disable_destructive: bool,

    /// Restrict operations to the in-cluster destination
    pub single_cluster: bool,

    /// Append-only audit file; audit records go to tracing when unset
    pub audit_log: Option<PathBuf>,

    /// Mask sensitive values in API responses
    pub mask_secrets: bool,

    /// Maximum calls per operation within the rate limit window
    pub rate_limit_calls: u32,

    /// Rate limit window in seconds
    pub rate_limit_window: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            read_only: true,
            disable_destructive: true,
            single_cluster: false,
            audit_log: None,
            mask_secrets: true,
            rate_limit_calls: 100,
            rate_limit_window: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse one of DEBUG, INFO, WARNING, ERROR, CRITICAL (case-insensitive)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Equivalent `tracing` filter directive
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}
