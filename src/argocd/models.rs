use serde_json::Value;

const IN_CLUSTER_SERVER: &str = "https://kubernetes.default.svc";

/// Flattened view of an ArgoCD `Application` resource
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub name: String,
    pub namespace: String,
    pub project: String,

    pub repo_url: String,
    pub path: String,
    pub target_revision: String,

    pub destination_server: String,
    /// Cluster name, when the destination is given by name
    pub destination_name: String,
    pub destination_namespace: String,

    pub sync_status: String,
    pub health_status: String,

    pub operation_state: Option<Value>,
    pub conditions: Vec<Value>,
    pub resources: Vec<Value>,
    pub history: Vec<Value>,
}

impl Application {
    /// Extract the fields from a raw API object, tolerating missing sections
    #[must_use]
    pub fn from_api_response(data: &Value) -> Self {
        let metadata = &data["metadata"];
        let spec = &data["spec"];
        let status = &data["status"];
        let source = &spec["source"];
        let destination = &spec["destination"];

        Self {
            name: str_or(&metadata["name"], ""),
            namespace: str_or(&metadata["namespace"], "argocd"),
            project: str_or(&spec["project"], "default"),
            repo_url: str_or(&source["repoURL"], ""),
            path: str_or(&source["path"], ""),
            target_revision: str_or(&source["targetRevision"], "HEAD"),
            destination_server: str_or(&destination["server"], ""),
            destination_name: str_or(&destination["name"], ""),
            destination_namespace: str_or(&destination["namespace"], ""),
            sync_status: str_or(&status["sync"]["status"], "Unknown"),
            health_status: str_or(&status["health"]["status"], "Unknown"),
            operation_state: status
                .get("operationState")
                .filter(|v| !v.is_null())
                .cloned(),
            conditions: array_of(&status["conditions"]),
            resources: array_of(&status["resources"]),
            history: array_of(&status["history"]),
        }
    }

    /// Cluster identity used by single-cluster mode
    ///
    /// The destination name when set, `in-cluster` for the local API server
    /// address, otherwise the server URL.
    #[must_use]
    pub fn destination_cluster(&self) -> &str {
        if !self.destination_name.is_empty() {
            &self.destination_name
        } else if self.destination_server == IN_CLUSTER_SERVER {
            crate::security::IN_CLUSTER
        } else {
            &self.destination_server
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.health_status == "Healthy"
    }

    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.sync_status == "Synced"
    }
}

/// String at `value`, or `default` when missing or not a string
#[must_use]
pub fn str_or(value: &Value, default: &str) -> String {
    value.as_str().unwrap_or(default).to_string()
}

/// Array at `value`, or empty
#[must_use]
pub fn array_of(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}
