//! Get Application Logs Tool Handler

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;

use crate::argocd::{ArgocdClient, LogsQuery};
use crate::error::{Result, ServerError};
use crate::mcp::standard_tool::{
    Completed, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

const DEFAULT_TAIL_LINES: u32 = 100;
const MAX_TAIL_LINES: u32 = 1000;

fn default_tail_lines() -> u32 {
    DEFAULT_TAIL_LINES
}

#[derive(Debug, Deserialize)]
pub struct GetApplicationLogsArgs {
    name: String,
    #[serde(default)]
    pod_name: Option<String>,
    #[serde(default)]
    container: Option<String>,
    #[serde(default = "default_tail_lines")]
    tail_lines: u32,
    #[serde(default)]
    since_seconds: Option<u64>,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(GetApplicationLogsArgs);

pub struct GetApplicationLogsTool;

#[async_trait]
impl StandardTool for GetApplicationLogsTool {
    type Args = GetApplicationLogsArgs;

    const NAME: &'static str = "get_application_logs";

    const DESCRIPTION: &'static str = "Fetch recent container logs for an application's pods. \
        Narrow down with pod_name and container for multi-pod or multi-container \
        workloads. Secrets in log lines are masked.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Application name"
            },
            "pod_name": {
                "type": "string",
                "description": "Specific pod name"
            },
            "container": {
                "type": "string",
                "description": "Container name for multi-container pods"
            },
            "tail_lines": {
                "type": "integer",
                "description": "Number of log lines to return (default: 100)",
                "minimum": 1,
                "maximum": 1000
            },
            "since_seconds": {
                "type": "integer",
                "description": "Only return logs newer than this many seconds",
                "minimum": 1
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": ["name"]
    }"#;

    async fn run(args: &GetApplicationLogsArgs, client: &ArgocdClient) -> Result<Completed> {
        let query = LogsQuery {
            pod_name: args.pod_name.clone(),
            container: args.container.clone(),
            tail_lines: args.tail_lines,
            since_seconds: args.since_seconds,
        };
        let logs = client.get_logs(&args.name, &query).await?;
        if logs.trim().is_empty() {
            return Ok(Completed::success(format!(
                "No logs found for application '{}'",
                args.name
            )));
        }

        let mut header = format!("Logs for '{}'", args.name);
        if let Some(pod) = &args.pod_name {
            let _ = write!(header, " (pod: {pod})");
        }
        if let Some(container) = &args.container {
            let _ = write!(header, " (container: {container})");
        }
        Ok(Completed::success(format!(
            "{header} (last {} lines):\n\n{logs}",
            args.tail_lines
        )))
    }

    fn validate(args: &GetApplicationLogsArgs) -> Result<()> {
        if !(1..=MAX_TAIL_LINES).contains(&args.tail_lines) {
            return Err(ServerError::McpInvalidRequest(format!(
                "tail_lines must be between 1 and {MAX_TAIL_LINES}, got {}",
                args.tail_lines
            )));
        }
        Ok(())
    }
}

/// Handler for the `get_application_logs` tool.
pub type GetApplicationLogsHandler = StandardToolHandler<GetApplicationLogsTool>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::ports::mock::create_test_context;
    use crate::ports::{HttpMethod, ToolHandler};
    use serde_json::json;

    #[tokio::test]
    async fn test_logs_with_header() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        mock.respond(
            HttpMethod::Get,
            "/applications/web/logs",
            json!({"content": "started\nlistening on :8080"}),
        );

        let result = GetApplicationLogsHandler::new()
            .execute(
                Some(json!({"name": "web", "pod_name": "web-0", "container": "app", "tail_lines": 20})),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(
            result.text_content(),
            "Logs for 'web' (pod: web-0) (container: app) (last 20 lines):\n\nstarted\nlistening on :8080"
        );

        let call = &mock.calls()[0];
        assert!(call.query.contains(&("tailLines", "20".to_string())));
        assert!(call.query.contains(&("container", "app".to_string())));
    }

    #[tokio::test]
    async fn test_default_tail_and_empty_logs() {
        let (ctx, mock) = create_test_context(SecurityConfig::default());
        let text = GetApplicationLogsHandler::new()
            .execute(Some(json!({"name": "web"})), &ctx)
            .await
            .unwrap()
            .text_content();

        assert_eq!(text, "No logs found for application 'web'");
        assert_eq!(mock.calls()[0].query, vec![("tailLines", "100".to_string())]);
    }

    #[tokio::test]
    async fn test_tail_lines_bounds() {
        let (ctx, _) = create_test_context(SecurityConfig::default());
        for tail in [0, 1001] {
            let result = GetApplicationLogsHandler::new()
                .execute(Some(json!({"name": "web", "tail_lines": tail})), &ctx)
                .await;
            assert!(matches!(result, Err(ServerError::McpInvalidRequest(_))));
        }
    }
}
