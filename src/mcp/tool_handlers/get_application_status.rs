//! Get Application Status Tool Handler

use async_trait::async_trait;
use serde::Deserialize;

use super::utils::status_marker;
use crate::argocd::ArgocdClient;
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct GetApplicationStatusArgs {
    name: String,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(GetApplicationStatusArgs);

pub struct GetApplicationStatusTool;

#[async_trait]
impl StandardTool for GetApplicationStatusTool {
    type Args = GetApplicationStatusArgs;

    const NAME: &'static str = "get_application_status";

    const DESCRIPTION: &'static str = "Quick health and sync summary for one application. \
        Use it to monitor progress after a sync, rollback or refresh.";

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

    async fn run(args: &GetApplicationStatusArgs, client: &ArgocdClient) -> Result<Completed> {
        let app = client.get_application(&args.name).await?;
        Ok(Completed::success(format!(
            "Application: {}\nHealth: {} {}\nSync: {} {}",
            app.name,
            app.health_status,
            status_marker(app.is_healthy()),
            app.sync_status,
            status_marker(app.is_synced()),
        )))
    }
}

/// Handler for the `get_application_status` tool.
pub type GetApplicationStatusHandler = StandardToolHandler<GetApplicationStatusTool>;
