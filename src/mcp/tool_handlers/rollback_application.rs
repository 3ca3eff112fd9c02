//! Rollback Application Tool Handler
//!
//! Rolls an application back to a previous deployment history entry.
//! Defaults to a dry run.

use async_trait::async_trait;
use serde::Deserialize;

use crate::argocd::ArgocdClient;
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, Gate, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RollbackApplicationArgs {
    name: String,
    revision_id: i64,
    #[serde(default = "default_true")]
    dry_run: bool,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(RollbackApplicationArgs);

pub struct RollbackApplicationTool;

#[async_trait]
impl StandardTool for RollbackApplicationTool {
    type Args = RollbackApplicationArgs;

    const NAME: &'static str = "rollback_application";

    const DESCRIPTION: &'static str = "Roll an application back to a previous deployment, \
        identified by its history ID from get_application_history. Runs as a dry run \
        unless dry_run=false.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Application name"
            },
            "revision_id": {
                "type": "integer",
                "description": "History ID to roll back to"
            },
            "dry_run": {
                "type": "boolean",
                "description": "Preview the rollback without applying it (default: true)"
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": ["name", "revision_id"]
    }"#;

    const GATE: Gate = Gate::Write;

    async fn run(args: &RollbackApplicationArgs, client: &ArgocdClient) -> Result<Completed> {
        client
            .rollback_application(&args.name, args.revision_id, args.dry_run)
            .await?;

        let (name, id) = (&args.name, args.revision_id);
        if args.dry_run {
            return Ok(Completed::with_result(
                format!(
                    "Dry-run rollback complete for '{name}' to revision {id}\n\n\
                     To apply the rollback:\n  \
                     rollback_application(name='{name}', revision_id={id}, dry_run=false)"
                ),
                "dry_run",
            ));
        }
        Ok(Completed::with_result(
            format!(
                "Rollback initiated for '{name}' to revision {id}\n\n\
                 Use get_application_status to monitor progress."
            ),
            "initiated",
        )
        .detail("revision_id", id))
    }
}

/// Handler for the `rollback_application` tool.
pub type RollbackApplicationHandler = StandardToolHandler<RollbackApplicationTool>;
