//! List Applications Tool Handler
//!
//! Lists ArgoCD applications with optional project, label, health and sync
//! filters. Health and sync filtering happens client-side.

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;

use super::utils::{status_marker, truncate_chars};
use crate::argocd::ArgocdClient;
use crate::error::Result;
use crate::mcp::standard_tool::{
    ALL_TARGETS, Completed, StandardTool, StandardToolHandler, default_instance,
    impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct ListApplicationsArgs {
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    health_status: Option<String>,
    #[serde(default)]
    sync_status: Option<String>,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(ListApplicationsArgs, ALL_TARGETS);

pub struct ListApplicationsTool;

#[async_trait]
impl StandardTool for ListApplicationsTool {
    type Args = ListApplicationsArgs;

    const NAME: &'static str = "list_applications";

    const DESCRIPTION: &'static str = "List ArgoCD applications with their health and sync \
        status. Filter by project, label selector, health status (Healthy, Degraded, \
        Progressing, Missing, Unknown) or sync status (Synced, OutOfSync, Unknown). Start \
        here to discover application names.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "project": {
                "type": "string",
                "description": "Filter by ArgoCD project name"
            },
            "selector": {
                "type": "string",
                "description": "Kubernetes label selector (e.g., team=payments)"
            },
            "health_status": {
                "type": "string",
                "description": "Filter by health status (Healthy, Degraded, Progressing, Missing, Unknown)"
            },
            "sync_status": {
                "type": "string",
                "description": "Filter by sync status (Synced, OutOfSync, Unknown)"
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": []
    }"#;

    async fn run(args: &ListApplicationsArgs, client: &ArgocdClient) -> Result<Completed> {
        let apps = client
            .list_applications(args.project.as_deref(), args.selector.as_deref())
            .await?;

        let apps: Vec<_> = apps
            .into_iter()
            .filter(|a| {
                args.health_status
                    .as_deref()
                    .is_none_or(|h| a.health_status == h)
            })
            .filter(|a| args.sync_status.as_deref().is_none_or(|s| a.sync_status == s))
            .collect();

        if apps.is_empty() {
            return Ok(Completed::success(
                "No applications found matching the specified filters.",
            ));
        }

        let mut out = format!("Found {} application(s):\n", apps.len());
        for app in &apps {
            let _ = write!(
                out,
                "\n- {} [{}] health={} {} sync={} {} dest={}@{}",
                app.name,
                app.project,
                app.health_status,
                status_marker(app.is_healthy()),
                app.sync_status,
                status_marker(app.is_synced()),
                app.destination_namespace,
                truncate_chars(app.destination_cluster(), 40),
            );
        }
        Ok(Completed::success(out))
    }

    fn success_target(args: &ListApplicationsArgs) -> String {
        format!("project={}", args.project.as_deref().unwrap_or("None"))
    }
}

/// Handler for the `list_applications` tool.
pub type ListApplicationsHandler = StandardToolHandler<ListApplicationsTool>;
