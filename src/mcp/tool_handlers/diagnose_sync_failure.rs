//! Diagnose Sync Failure Tool Handler
//!
//! Combines the application status, its resource tree and recent events
//! into a list of likely issues with remediation hints.

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::{resource_label, truncate_chars};
use crate::argocd::{Application, ArgocdClient, array_of, str_or};
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

/// Only the most recent events are scanned
const MAX_EVENTS: usize = 20;
const MAX_UNHEALTHY_LISTED: usize = 5;
const EVENT_EXCERPT: usize = 100;

const FAILING_CONDITIONS: &[&str] = &["ComparisonError", "InvalidSpecError", "SyncError"];

#[derive(Debug, Deserialize)]
pub struct DiagnoseSyncFailureArgs {
    name: String,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(DiagnoseSyncFailureArgs);

/// Issues found so far and the deduplicated suggestions
#[derive(Debug, Default)]
struct Diagnosis {
    issues: Vec<String>,
    suggestions: Vec<String>,
}

impl Diagnosis {
    fn issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    fn suggest(&mut self, suggestion: &str) {
        if !self.suggestions.iter().any(|s| s == suggestion) {
            self.suggestions.push(suggestion.to_string());
        }
    }

    fn check_status(&mut self, app: &Application) {
        if app.sync_status == "OutOfSync" {
            self.issue(format!(
                "Application is out of sync (revision: {})",
                app.target_revision
            ));
            self.suggest("Run get_application_diff to see pending changes");
        }

        match app.health_status.as_str() {
            "Degraded" => self.issue("Application health is Degraded"),
            "Progressing" => {
                self.issue("Application is still progressing");
                self.suggest("Wait for operations to complete or check for stuck resources");
            }
            "Missing" => {
                self.issue("Application resources are missing from cluster");
                self.suggest("Verify destination cluster connectivity and namespace exists");
            }
            _ => {}
        }

        if let Some(op) = &app.operation_state {
            match op["phase"].as_str() {
                Some("Failed" | "Error") => self.issue(format!(
                    "Last operation failed: {}",
                    str_or(&op["message"], "")
                )),
                Some("Running") => self.issue("Sync operation currently running"),
                _ => {}
            }
        }

        for cond in &app.conditions {
            let kind = str_or(&cond["type"], "");
            if FAILING_CONDITIONS.contains(&kind.as_str()) {
                self.issue(format!("[{kind}] {}", str_or(&cond["message"], "")));
            }
        }
    }

    fn check_events(&mut self, events: &[Value]) {
        for event in events.iter().take(MAX_EVENTS) {
            let msg = str_or(&event["message"], "");
            let reason = str_or(&event["reason"], "");
            let excerpt = truncate_chars(&msg, EVENT_EXCERPT);

            if msg.contains("ImagePullBackOff") || msg.contains("ErrImagePull") {
                self.issue(format!("Image pull failed: {excerpt}"));
                self.suggest("Verify image exists and registry credentials are configured");
            } else if msg.contains("CrashLoopBackOff") {
                self.issue(format!("Container crashing: {excerpt}"));
                self.suggest("Check pod logs for application startup errors");
            } else if msg.contains("Forbidden") || msg.to_lowercase().contains("unauthorized") {
                self.issue(format!("RBAC permission denied: {excerpt}"));
                self.suggest("Review ServiceAccount permissions in destination cluster");
            } else if msg.contains("OOMKilled") {
                self.issue("Container killed due to memory limit");
                self.suggest("Increase memory limits or optimize application memory usage");
            } else if reason.contains("PodUnschedulable")
                || reason == "FailedScheduling"
                || msg.contains("Insufficient")
            {
                self.issue(format!("Scheduling failed: {excerpt}"));
                self.suggest("Check cluster capacity and node availability");
            }
        }
    }

    fn check_tree(&mut self, tree: &Value) {
        let unhealthy: Vec<Value> = array_of(&tree["nodes"])
            .into_iter()
            .filter(|n| matches!(n["health"]["status"].as_str(), Some("Degraded" | "Missing")))
            .collect();
        if unhealthy.is_empty() {
            return;
        }

        self.issue(format!(
            "Found {} unhealthy resources in resource tree",
            unhealthy.len()
        ));
        for node in unhealthy.iter().take(MAX_UNHEALTHY_LISTED) {
            self.issue(format!(
                "  - {}: {}",
                resource_label(node),
                str_or(&node["health"]["message"], "N/A")
            ));
        }
    }

    fn render(&self, name: &str, app: &Application) -> String {
        let mut out = format!("Diagnosis for '{name}':\n\n");
        if self.issues.is_empty() {
            out.push_str("No issues detected. Application appears healthy.\n");
            let _ = write!(
                out,
                "Health: {}, Sync: {}",
                app.health_status, app.sync_status
            );
        } else {
            let _ = write!(out, "Found {} issue(s):", self.issues.len());
            for issue in &self.issues {
                let _ = write!(out, "\n  - {issue}");
            }
        }

        if !self.suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for suggestion in &self.suggestions {
                let _ = write!(out, "\n  - {suggestion}");
            }
        }
        out
    }
}

pub struct DiagnoseSyncFailureTool;

#[async_trait]
impl StandardTool for DiagnoseSyncFailureTool {
    type Args = DiagnoseSyncFailureArgs;

    const NAME: &'static str = "diagnose_sync_failure";

    const DESCRIPTION: &'static str = "Diagnose why an application fails to sync or is \
        unhealthy. Analyzes status, operation state, conditions, Kubernetes events (image \
        pull errors, crash loops, RBAC denials, OOM kills, scheduling failures) and \
        unhealthy resources, and suggests next steps.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Application name"
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": ["name"]
    }"#;

    async fn run(args: &DiagnoseSyncFailureArgs, client: &ArgocdClient) -> Result<Completed> {
        let app = client.get_application(&args.name).await?;
        let tree = client.get_resource_tree(&args.name).await?;
        let events = client.get_application_events(&args.name, None, None).await?;

        let mut diagnosis = Diagnosis::default();
        diagnosis.check_status(&app);
        diagnosis.check_events(&events);
        diagnosis.check_tree(&tree);
        Ok(Completed::success(diagnosis.render(&args.name, &app)))
    }
}

/// Handler for the `diagnose_sync_failure` tool.
pub type DiagnoseSyncFailureHandler = StandardToolHandler<DiagnoseSyncFailureTool>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::ports::mock::create_test_context;
    use crate::ports::{HttpMethod, ToolHandler};
    use serde_json::json;

    fn app(status: Value) -> Application {
        Application::from_api_response(&json!({"metadata": {"name": "web"}, "status": status}))
    }

    // ====== Status checks ======

    #[test]
    fn test_out_of_sync_and_progressing() {
        let mut d = Diagnosis::default();
        d.check_status(&app(json!({
            "sync": {"status": "OutOfSync"},
            "health": {"status": "Progressing"}
        })));
        assert_eq!(
            d.issues,
            vec![
                "Application is out of sync (revision: HEAD)",
                "Application is still progressing"
            ]
        );
        assert_eq!(d.suggestions.len(), 2);
    }

    #[test]
    fn test_failed_operation_and_conditions() {
        let mut d = Diagnosis::default();
        d.check_status(&app(json!({
            "operationState": {"phase": "Failed", "message": "one or more objects failed"},
            "conditions": [
                {"type": "ComparisonError", "message": "repo unreachable"},
                {"type": "OrphanedResourceWarning", "message": "ignored"}
            ]
        })));
        assert_eq!(
            d.issues,
            vec![
                "Last operation failed: one or more objects failed",
                "[ComparisonError] repo unreachable"
            ]
        );
    }

    // ====== Event checks ======

    #[test]
    fn test_event_patterns() {
        let mut d = Diagnosis::default();
        d.check_events(&[
            json!({"message": "Back-off pulling image: ImagePullBackOff"}),
            json!({"message": "Back-off restarting: CrashLoopBackOff"}),
            json!({"message": "pods is forbidden: Forbidden"}),
            json!({"message": "container was OOMKilled"}),
            json!({"reason": "FailedScheduling", "message": "0/3 nodes: Insufficient cpu"}),
            json!({"message": "Scaled up replica set"}),
        ]);
        assert_eq!(d.issues.len(), 5);
        assert!(d.issues[0].starts_with("Image pull failed:"));
        assert!(d.issues[1].starts_with("Container crashing:"));
        assert!(d.issues[2].starts_with("RBAC permission denied:"));
        assert_eq!(d.issues[3], "Container killed due to memory limit");
        assert!(d.issues[4].starts_with("Scheduling failed:"));
        assert_eq!(d.suggestions.len(), 5);
    }

    #[test]
    fn test_suggestions_deduplicated() {
        let mut d = Diagnosis::default();
        d.check_events(&[
            json!({"message": "CrashLoopBackOff a"}),
            json!({"message": "CrashLoopBackOff b"}),
        ]);
        assert_eq!(d.issues.len(), 2);
        assert_eq!(d.suggestions, vec!["Check pod logs for application startup errors"]);
    }

    #[test]
    fn test_only_recent_events_scanned() {
        let events: Vec<Value> = (0..30).map(|_| json!({"message": "OOMKilled"})).collect();
        let mut d = Diagnosis::default();
        d.check_events(&events);
        assert_eq!(d.issues.len(), MAX_EVENTS);
    }

    // ====== Tree checks ======

    #[test]
    fn test_unhealthy_tree_nodes_capped() {
        let nodes: Vec<Value> = (0..7)
            .map(|i| json!({"kind": "Pod", "name": format!("web-{i}"), "health": {"status": "Degraded", "message": "crash"}}))
            .chain(std::iter::once(json!({"kind": "Service", "name": "ok", "health": {"status": "Healthy"}})))
            .collect();
        let mut d = Diagnosis::default();
        d.check_tree(&json!({"nodes": nodes}));

        assert_eq!(d.issues[0], "Found 7 unhealthy resources in resource tree");
        assert_eq!(d.issues.len(), 1 + MAX_UNHEALTHY_LISTED);
        assert_eq!(d.issues[1], "  - Pod/web-0: crash");
    }

    // ====== End to end ======

    #[tokio::test]
    async fn test_healthy_application() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        mock.respond(
            HttpMethod::Get,
            "/applications/web",
            json!({"metadata": {"name": "web"}, "status": {"health": {"status": "Healthy"}, "sync": {"status": "Synced"}}}),
        );

        let text = DiagnoseSyncFailureHandler::new()
            .execute(Some(json!({"name": "web"})), &ctx)
            .await
            .unwrap()
            .text_content();
        assert_eq!(
            text,
            "Diagnosis for 'web':\n\nNo issues detected. Application appears healthy.\nHealth: Healthy, Sync: Synced"
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_issues_rendered_with_suggestions() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        mock.respond(
            HttpMethod::Get,
            "/applications/web",
            json!({"status": {"health": {"status": "Missing"}, "sync": {"status": "Synced"}}}),
        );

        let text = DiagnoseSyncFailureHandler::new()
            .execute(Some(json!({"name": "web"})), &ctx)
            .await
            .unwrap()
            .text_content();
        assert_eq!(
            text,
            "Diagnosis for 'web':\n\nFound 1 issue(s):\n  - Application resources are missing from cluster\n\n\
             Suggestions:\n  - Verify destination cluster connectivity and namespace exists"
        );
    }

    #[tokio::test]
    async fn test_tree_failure_is_error_result() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        mock.fail(HttpMethod::Get, "/applications/web/resource-tree", 500, "internal");

        let result = DiagnoseSyncFailureHandler::new()
            .execute(Some(json!({"name": "web"})), &ctx)
            .await
            .unwrap();
        assert!(result.is_error());
    }
}
