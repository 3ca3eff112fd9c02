//! Sync Application Tool Handler
//!
//! Deploys the application's Git state to its cluster. A plain sync goes
//! through the write gate; a real sync with pruning deletes cluster
//! resources and goes through the destructive gate as `sync_with_prune`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::argocd::SyncOptions;
use crate::error::Result;
use crate::mcp::protocol::ToolCallResult;
use crate::mcp::standard_tool::{
    backend_failure, default_instance, deny, deny_blocked, deny_foreign_cluster, parse_args,
};
use crate::ports::{ToolContext, ToolHandler, ToolSchema};
use crate::security::SafetyDenial;

const NAME: &str = "sync_application";
const PRUNE_OPERATION: &str = "sync_with_prune";
const PRUNE_CONFIRMATION_REASON: &str = "prune requires confirmation";

const DESCRIPTION: &str = "Sync an application to its target state in Git. Runs as a dry \
    run unless dry_run=false. A real sync with prune=true deletes resources missing from \
    Git and needs confirm=true plus confirm_name set to the application name.";

const SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "name": {
            "type": "string",
            "description": "Application name"
        },
        "dry_run": {
            "type": "boolean",
            "description": "Preview the sync without applying it (default: true)"
        },
        "prune": {
            "type": "boolean",
            "description": "Delete resources that are no longer defined in Git (default: false)"
        },
        "force": {
            "type": "boolean",
            "description": "Force apply, replacing resources when needed (default: false)"
        },
        "revision": {
            "type": "string",
            "description": "Git revision to sync to (default: the tracked revision)"
        },
        "confirm": {
            "type": "boolean",
            "description": "Required for a real sync with prune=true"
        },
        "confirm_name": {
            "type": "string",
            "description": "Application name, repeated to confirm a pruning sync"
        },
        "instance": {
            "type": "string",
            "description": "ArgoCD instance name (default: primary)"
        }
    },
    "required": ["name"]
}"#;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SyncApplicationArgs {
    name: String,
    #[serde(default = "default_true")]
    dry_run: bool,
    #[serde(default)]
    prune: bool,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    confirm: bool,
    #[serde(default)]
    confirm_name: Option<String>,
    #[serde(default = "default_instance")]
    instance: String,
}

impl SyncApplicationArgs {
    const fn prunes(&self) -> bool {
        self.prune && !self.dry_run
    }
}

/// Handler for the `sync_application` tool.
#[derive(Debug, Default)]
pub struct SyncApplicationHandler;

impl SyncApplicationHandler {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run the gate matching the requested sync and render any denial
    fn gate(args: &SyncApplicationArgs, ctx: &ToolContext) -> Result<Option<ToolCallResult>> {
        if !args.prunes() {
            return match ctx.guard.check_write_operation(NAME) {
                Some(blocked) => deny_blocked(ctx, NAME, &args.name, &blocked).map(Some),
                None => Ok(None),
            };
        }

        match ctx.guard.check_destructive_operation(
            PRUNE_OPERATION,
            &args.name,
            args.confirm,
            args.confirm_name.as_deref(),
        ) {
            None => Ok(None),
            Some(SafetyDenial::Blocked(blocked)) => {
                deny_blocked(ctx, NAME, &args.name, &blocked).map(Some)
            }
            Some(SafetyDenial::ConfirmationRequired(confirmation)) => {
                let confirmation = confirmation.with_detail(
                    "Preview first",
                    format!(
                        "sync_application(name='{}', dry_run=true, prune=true)",
                        args.name
                    ),
                );
                deny(
                    ctx,
                    NAME,
                    &args.name,
                    PRUNE_CONFIRMATION_REASON,
                    confirmation.format_message(),
                )
                .map(Some)
            }
        }
    }
}

#[async_trait]
impl ToolHandler for SyncApplicationHandler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME,
            description: DESCRIPTION,
            input_schema: SCHEMA,
        }
    }

    async fn execute(&self, args: Option<Value>, ctx: &ToolContext) -> Result<ToolCallResult> {
        let args: SyncApplicationArgs = parse_args(args)?;

        if let Some(denied) = Self::gate(&args, ctx)? {
            return Ok(denied);
        }

        let client = ctx.client(&args.instance)?;
        if let Some(denied) = deny_foreign_cluster(ctx, client, NAME, &args.name).await? {
            return Ok(denied);
        }

        info!(
            tool = NAME,
            instance = %args.instance,
            target = %args.name,
            dry_run = args.dry_run,
            prune = args.prune,
            "Executing tool"
        );

        let options = SyncOptions {
            dry_run: args.dry_run,
            prune: args.prune,
            force: args.force,
            revision: args.revision.clone(),
        };
        if let Err(e) = client.sync_application(&args.name, &options).await {
            return backend_failure(ctx, NAME, &args.name, e);
        }

        let name = &args.name;
        if args.dry_run {
            ctx.audit.log_write(NAME, name, "dry_run", None)?;
            return Ok(ToolCallResult::text(format!(
                "Dry-run sync complete for '{name}'\n\n\
                 Operation would affect resources. To apply:\n  \
                 sync_application(name='{name}', dry_run=false)"
            )));
        }

        let mut details = Map::new();
        details.insert("prune".to_string(), args.prune.into());
        details.insert("force".to_string(), args.force.into());
        ctx.audit.log_write(NAME, name, "initiated", Some(details))?;

        let revision = args
            .revision
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("HEAD");
        Ok(ToolCallResult::text(format!(
            "Sync initiated for '{name}'\nRevision: {revision}\nPrune: {}\n\n\
             Use get_application_status to monitor progress.",
            args.prune
        )))
    }
}
