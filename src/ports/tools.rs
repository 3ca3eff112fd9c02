//! Tool Handler Port
//!
//! Each MCP tool implements [`ToolHandler`] and receives a [`ToolContext`]
//! holding everything it may touch: configuration, the safety guard, the
//! audit trail and one ArgoCD client per configured instance.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::argocd::ArgocdApi;
use super::protocol::ToolCallResult;
use crate::argocd::{ArgocdClient, ArgocdHttp};
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::security::{AuditLogger, SafetyGuard, Sanitizer};

/// Schema definition for a tool
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: &'static str,
}

/// ArgoCD clients by instance name, in configuration order
#[derive(Clone, Default)]
pub struct ClientSet {
    clients: Vec<(String, ArgocdClient)>,
}

impl ClientSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one HTTP client per configured instance
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let sanitizer = Arc::new(Sanitizer::new(config.security.mask_secrets));
        let mut set = Self::new();
        for instance in config.all_instances() {
            let http = ArgocdHttp::new(&instance, Arc::clone(&sanitizer))?;
            info!(instance = %instance.name, url = %instance.url, "Configured ArgoCD instance");
            set.insert(instance.name.clone(), Arc::new(http));
        }
        Ok(set)
    }

    /// Add or replace the client for `name`
    pub fn insert(&mut self, name: impl Into<String>, api: Arc<dyn ArgocdApi>) {
        let name = name.into();
        let client = ArgocdClient::new(api);
        match self.clients.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = client,
            None => self.clients.push((name, client)),
        }
    }

    /// # Errors
    ///
    /// Returns [`ServerError::UnknownInstance`] listing the known names.
    pub fn get(&self, name: &str) -> Result<&ArgocdClient> {
        self.clients
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| ServerError::UnknownInstance {
                instance: name.to_string(),
                available: self.names().join(", "),
            })
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.clients.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Context provided to tool handlers during execution
pub struct ToolContext {
    pub config: Arc<Config>,
    pub guard: Arc<SafetyGuard>,
    pub audit: Arc<AuditLogger>,
    pub clients: Arc<ClientSet>,
}

impl ToolContext {
    pub fn new(
        config: Arc<Config>,
        guard: Arc<SafetyGuard>,
        audit: Arc<AuditLogger>,
        clients: Arc<ClientSet>,
    ) -> Self {
        Self {
            config,
            guard,
            audit,
            clients,
        }
    }

    /// Wire the guard, audit trail and clients from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit settings are invalid or a client
    /// cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let clients = ClientSet::from_config(&config)?;
        Self::with_clients(config, clients)
    }

    /// Same as [`from_config`](Self::from_config) with prebuilt clients
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit settings are invalid.
    pub fn with_clients(config: Config, clients: ClientSet) -> Result<Self> {
        let guard = SafetyGuard::new(Arc::new(config.security.clone()))?;
        let audit = AuditLogger::new(config.security.audit_log.clone());
        Ok(Self::new(
            Arc::new(config),
            Arc::new(guard),
            Arc::new(audit),
            Arc::new(clients),
        ))
    }

    /// Client for `instance`
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownInstance`] if it is not configured.
    pub fn client(&self, instance: &str) -> Result<&ArgocdClient> {
        self.clients.get(instance)
    }
}

/// Trait for tool handlers
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool name (used for routing)
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the given arguments
    ///
    /// Authorization denials and backend failures come back as tool
    /// results; `Err` is reserved for bad arguments, unknown instances and
    /// audit write failures.
    async fn execute(&self, args: Option<Value>, ctx: &ToolContext) -> Result<ToolCallResult>;
}
