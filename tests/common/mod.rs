//! Shared fixtures: an in-memory ArgoCD backend and context builders

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use argocd_mcp::config::{Config, SecurityConfig};
use argocd_mcp::error::{Result, ServerError};
use argocd_mcp::ports::{ApiRequest, ArgocdApi, ClientSet, HttpMethod, ToolContext};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// ArgoCD stand-in keyed by `"{METHOD} {path}"`
#[derive(Default)]
pub struct FakeArgocd {
    responses: Mutex<HashMap<String, Value>>,
    errors: Mutex<HashMap<String, (u16, String)>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeArgocd {
    pub fn respond(&self, method: HttpMethod, path: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), body);
    }

    pub fn fail(&self, method: HttpMethod, path: &str, code: u16, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), (code, message.to_string()));
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: HttpMethod, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl ArgocdApi for FakeArgocd {
    fn instance_name(&self) -> &str {
        "primary"
    }

    async fn request(&self, request: ApiRequest) -> Result<Value> {
        let key = format!("{} {}", request.method, request.path);
        self.calls.lock().unwrap().push(request);

        if let Some((code, message)) = self.errors.lock().unwrap().get(&key) {
            return Err(ServerError::Api {
                code: *code,
                message: message.clone(),
                details: None,
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }
}

/// Every gate open
pub fn permissive() -> SecurityConfig {
    SecurityConfig {
        read_only: false,
        disable_destructive: false,
        ..SecurityConfig::default()
    }
}

/// Tool context over a fake `primary` instance, auditing to `audit_log` if given
pub fn context(
    security: SecurityConfig,
    audit_log: Option<&Path>,
) -> (ToolContext, Arc<FakeArgocd>) {
    let fake = Arc::new(FakeArgocd::default());
    let mut clients = ClientSet::new();
    clients.insert("primary", Arc::clone(&fake) as Arc<dyn ArgocdApi>);

    let config = Config {
        security: SecurityConfig {
            audit_log: audit_log.map(Path::to_path_buf),
            ..security
        },
        ..Config::default()
    };
    (ToolContext::with_clients(config, clients).unwrap(), fake)
}

/// Parsed JSON lines of an audit file
pub fn audit_entries(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
