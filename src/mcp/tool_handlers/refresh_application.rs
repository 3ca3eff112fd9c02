//! Refresh Application Tool Handler

use async_trait::async_trait;
use serde::Deserialize;

use crate::argocd::ArgocdClient;
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, Gate, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct RefreshApplicationArgs {
    name: String,
    #[serde(default)]
    hard: bool,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(RefreshApplicationArgs);

pub struct RefreshApplicationTool;

#[async_trait]
impl StandardTool for RefreshApplicationTool {
    type Args = RefreshApplicationArgs;

    const NAME: &'static str = "refresh_application";

    const DESCRIPTION: &'static str = "Make ArgoCD re-read the application's manifests from \
        Git and recompute its sync status. A hard refresh also invalidates the manifest \
        cache. Does not deploy anything.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Application name"
            },
            "hard": {
                "type": "boolean",
                "description": "Force hard refresh, invalidating the manifest cache (default: false)"
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": ["name"]
    }"#;

    const GATE: Gate = Gate::Write;

    async fn run(args: &RefreshApplicationArgs, client: &ArgocdClient) -> Result<Completed> {
        let app = client.refresh_application(&args.name, args.hard).await?;
        let kind = if args.hard { "hard" } else { "normal" };
        Ok(Completed::success(format!(
            "Refresh triggered for '{}' ({kind})\nCurrent status: health={}, sync={}",
            args.name, app.health_status, app.sync_status
        ))
        .detail("hard", args.hard))
    }
}

/// Handler for the `refresh_application` tool.
pub type RefreshApplicationHandler = StandardToolHandler<RefreshApplicationTool>;
