//! Terminate Sync Tool Handler

use async_trait::async_trait;
use serde::Deserialize;

use crate::argocd::ArgocdClient;
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, Gate, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct TerminateSyncArgs {
    name: String,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(TerminateSyncArgs);

pub struct TerminateSyncTool;

#[async_trait]
impl StandardTool for TerminateSyncTool {
    type Args = TerminateSyncArgs;

    const NAME: &'static str = "terminate_sync";

    const DESCRIPTION: &'static str = "Stop the sync operation currently running for an \
        application. Resources already applied stay as they are.";

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

    const GATE: Gate = Gate::Write;

    async fn run(args: &TerminateSyncArgs, client: &ArgocdClient) -> Result<Completed> {
        client.terminate_sync(&args.name).await?;
        Ok(Completed::with_result(
            format!(
                "Sync operation terminated for '{}'\n\n\
                 Use get_application_status to check current state.",
                args.name
            ),
            "terminated",
        ))
    }
}

/// Handler for the `terminate_sync` tool.
pub type TerminateSyncHandler = StandardToolHandler<TerminateSyncTool>;
