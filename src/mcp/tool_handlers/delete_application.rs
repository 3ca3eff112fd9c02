//! Delete Application Tool Handler
//!
//! The only tool behind the full destructive gate: permission flags first,
//! then two-factor confirmation echoing the application name.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::utils::truncate_chars;
use crate::argocd::ArgocdClient;
use crate::error::Result;
use crate::mcp::protocol::ToolCallResult;
use crate::mcp::standard_tool::{
    backend_failure, default_instance, deny, deny_blocked, deny_foreign_cluster, parse_args,
};
use crate::ports::{ToolContext, ToolHandler, ToolSchema};
use crate::security::{ConfirmationRequired, SafetyDenial};

const NAME: &str = "delete_application";
const CONFIRMATION_REASON: &str = "confirmation required";

const DESCRIPTION: &str = "Delete an application from ArgoCD. With cascade=true (default) \
    its cluster resources are deleted too. Requires confirm=true and confirm_name set to \
    the application name, and destructive operations enabled on the server.";

const SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "name": {
            "type": "string",
            "description": "Application name to delete"
        },
        "cascade": {
            "type": "boolean",
            "description": "Also delete the application's cluster resources (default: true)"
        },
        "confirm": {
            "type": "boolean",
            "description": "Must be true to execute the deletion"
        },
        "confirm_name": {
            "type": "string",
            "description": "Application name, repeated to confirm the deletion"
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
struct DeleteApplicationArgs {
    name: String,
    #[serde(default = "default_true")]
    cascade: bool,
    #[serde(default)]
    confirm: bool,
    #[serde(default)]
    confirm_name: Option<String>,
    #[serde(default = "default_instance")]
    instance: String,
}

/// Handler for the `delete_application` tool.
#[derive(Debug, Default)]
pub struct DeleteApplicationHandler;

impl DeleteApplicationHandler {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Add what the deletion would touch, when the application can be read
    async fn describe_impact(
        confirmation: &mut ConfirmationRequired,
        args: &DeleteApplicationArgs,
        client: &ArgocdClient,
    ) {
        let app = match client.get_application(&args.name).await {
            Ok(app) => app,
            Err(e) => {
                debug!(target = %args.name, error = %e, "Could not describe deletion impact");
                return;
            }
        };
        confirmation.set_detail("namespace", app.destination_namespace.as_str());
        confirmation.set_detail("cluster", truncate_chars(&app.destination_server, 50));
        confirmation.set_detail("cascade", args.cascade.to_string());
        confirmation.set_detail(
            "effect",
            if args.cascade {
                "DELETE cluster resources"
            } else {
                "ORPHAN cluster resources"
            },
        );
    }
}

#[async_trait]
impl ToolHandler for DeleteApplicationHandler {
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
        let args: DeleteApplicationArgs = parse_args(args)?;

        match ctx.guard.check_destructive_operation(
            NAME,
            &args.name,
            args.confirm,
            args.confirm_name.as_deref(),
        ) {
            None => {}
            Some(SafetyDenial::Blocked(blocked)) => {
                return deny_blocked(ctx, NAME, &args.name, &blocked);
            }
            Some(SafetyDenial::ConfirmationRequired(mut confirmation)) => {
                if let Ok(client) = ctx.client(&args.instance) {
                    Self::describe_impact(&mut confirmation, &args, client).await;
                }
                return deny(
                    ctx,
                    NAME,
                    &args.name,
                    CONFIRMATION_REASON,
                    confirmation.format_message(),
                );
            }
        }

        let client = ctx.client(&args.instance)?;
        if let Some(denied) = deny_foreign_cluster(ctx, client, NAME, &args.name).await? {
            return Ok(denied);
        }

        info!(
            tool = NAME,
            instance = %args.instance,
            target = %args.name,
            cascade = args.cascade,
            "Executing tool"
        );
        if let Err(e) = client.delete_application(&args.name, args.cascade).await {
            return backend_failure(ctx, NAME, &args.name, e);
        }

        let mut details = Map::new();
        details.insert("cascade".to_string(), args.cascade.into());
        ctx.audit.log_write(NAME, &args.name, "deleted", Some(details))?;

        Ok(ToolCallResult::text(format!(
            "Application '{}' deleted successfully.\nCascade: {}",
            args.name, args.cascade
        )))
    }
}
