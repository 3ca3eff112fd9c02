//! Get Application Tool Handler
//!
//! Detailed view of one application: source, destination, status, last
//! operation and conditions.

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;

use crate::argocd::{Application, ArgocdClient, str_or};
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct GetApplicationArgs {
    name: String,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(GetApplicationArgs);

pub struct GetApplicationTool;

#[async_trait]
impl StandardTool for GetApplicationTool {
    type Args = GetApplicationArgs;

    const NAME: &'static str = "get_application";

    const DESCRIPTION: &'static str = "Get the full details of an ArgoCD application: Git \
        source, destination cluster and namespace, sync and health status, the last \
        operation and any conditions reported by ArgoCD.";

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

    async fn run(args: &GetApplicationArgs, client: &ArgocdClient) -> Result<Completed> {
        let app = client.get_application(&args.name).await?;
        Ok(Completed::success(render(&app)))
    }
}

fn render(app: &Application) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Application: {}", app.name);
    let _ = writeln!(out, "Project: {}", app.project);
    let _ = writeln!(out, "Namespace: {}", app.namespace);

    out.push_str("\nSource:\n");
    let _ = writeln!(out, "  Repository: {}", app.repo_url);
    let _ = writeln!(out, "  Path: {}", app.path);
    let _ = writeln!(out, "  Target Revision: {}", app.target_revision);

    out.push_str("\nDestination:\n");
    if app.destination_name.is_empty() {
        let _ = writeln!(out, "  Server: {}", app.destination_server);
    } else {
        let _ = writeln!(out, "  Cluster: {}", app.destination_name);
    }
    let _ = writeln!(out, "  Namespace: {}", app.destination_namespace);

    out.push_str("\nStatus:\n");
    let _ = writeln!(out, "  Sync: {}", app.sync_status);
    let _ = write!(out, "  Health: {}", app.health_status);

    if let Some(op) = &app.operation_state {
        out.push_str("\n\nLast Operation:\n");
        let _ = writeln!(out, "  Phase: {}", str_or(&op["phase"], "Unknown"));
        let _ = write!(out, "  Message: {}", str_or(&op["message"], "N/A"));
    }

    if !app.conditions.is_empty() {
        out.push_str("\n\nConditions:");
        for cond in &app.conditions {
            let _ = write!(
                out,
                "\n  - [{}] {}",
                str_or(&cond["type"], "Unknown"),
                str_or(&cond["message"], "N/A")
            );
        }
    }
    out
}

/// Handler for the `get_application` tool.
pub type GetApplicationHandler = StandardToolHandler<GetApplicationTool>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::error::ServerError;
    use crate::ports::mock::create_test_context;
    use crate::ports::{HttpMethod, ToolHandler};
    use serde_json::json;

    #[tokio::test]
    async fn test_renders_sections() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        mock.respond(
            HttpMethod::Get,
            "/applications/web",
            json!({
                "metadata": {"name": "web", "namespace": "argocd"},
                "spec": {
                    "project": "team-a",
                    "source": {"repoURL": "https://git.example.com/web.git", "path": "deploy", "targetRevision": "main"},
                    "destination": {"server": "https://kubernetes.default.svc", "namespace": "web"}
                },
                "status": {
                    "sync": {"status": "OutOfSync"},
                    "health": {"status": "Degraded"},
                    "operationState": {"phase": "Failed", "message": "hook failed"},
                    "conditions": [{"type": "SyncError", "message": "boom"}]
                }
            }),
        );

        let result = GetApplicationHandler::new()
            .execute(Some(json!({"name": "web"})), &ctx)
            .await
            .unwrap();
        let text = result.text_content();

        assert!(text.starts_with("Application: web\nProject: team-a\nNamespace: argocd"));
        assert!(text.contains("  Repository: https://git.example.com/web.git"));
        assert!(text.contains("  Target Revision: main"));
        assert!(text.contains("  Server: https://kubernetes.default.svc"));
        assert!(text.contains("Last Operation:\n  Phase: Failed\n  Message: hook failed"));
        assert!(text.ends_with("Conditions:\n  - [SyncError] boom"));
    }

    #[tokio::test]
    async fn test_minimal_application() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        mock.respond(
            HttpMethod::Get,
            "/applications/bare",
            json!({"metadata": {"name": "bare"}}),
        );

        let text = GetApplicationHandler::new()
            .execute(Some(json!({"name": "bare"})), &ctx)
            .await
            .unwrap()
            .text_content();
        assert!(text.ends_with("  Health: Unknown"));
        assert!(!text.contains("Last Operation"));
        assert!(!text.contains("Conditions"));
    }

    #[tokio::test]
    async fn test_missing_name() {
        let (ctx, _) = create_test_context(SecurityConfig::default());
        let result = GetApplicationHandler::new()
            .execute(Some(json!({})), &ctx)
            .await;
        assert!(matches!(result, Err(ServerError::McpInvalidRequest(_))));
    }

    #[test]
    fn test_schema() {
        let handler = GetApplicationHandler::new();
        let schema: serde_json::Value = serde_json::from_str(handler.schema().input_schema).unwrap();
        assert_eq!(schema["required"], json!(["name"]));
    }
}
