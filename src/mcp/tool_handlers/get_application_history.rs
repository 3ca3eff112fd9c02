//! Get Application History Tool Handler

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;

use super::utils::truncate_chars;
use crate::argocd::{ArgocdClient, str_or};
use crate::error::{Result, ServerError};
use crate::mcp::standard_tool::{
    Completed, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct GetApplicationHistoryArgs {
    name: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(GetApplicationHistoryArgs);

pub struct GetApplicationHistoryTool;

#[async_trait]
impl StandardTool for GetApplicationHistoryTool {
    type Args = GetApplicationHistoryArgs;

    const NAME: &'static str = "get_application_history";

    const DESCRIPTION: &'static str = "Deployment history of an application, newest first, \
        with the revision, deploy time and initiator. The history IDs are what \
        rollback_application expects.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Application name"
            },
            "limit": {
                "type": "integer",
                "description": "Maximum number of history entries (default: 10)",
                "minimum": 1,
                "maximum": 50
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": ["name"]
    }"#;

    async fn run(args: &GetApplicationHistoryArgs, client: &ArgocdClient) -> Result<Completed> {
        let history = client
            .get_application_history(&args.name, args.limit)
            .await?;
        if history.is_empty() {
            return Ok(Completed::success(format!(
                "No deployment history found for application '{}'",
                args.name
            )));
        }

        let mut out = format!(
            "Deployment history for '{}' (last {} entries):\n",
            args.name,
            history.len()
        );
        for (i, entry) in history.iter().rev().enumerate() {
            let revision = str_or(&entry["revision"], "unknown");
            let id = entry["id"]
                .as_i64()
                .map(|id| format!(" id={id}"))
                .unwrap_or_default();
            let _ = write!(
                out,
                "\n{}. [{}]{id} at {} by {}",
                i + 1,
                truncate_chars(&revision, 8),
                str_or(&entry["deployedAt"], "unknown"),
                str_or(&entry["initiatedBy"]["username"], "unknown"),
            );
        }
        Ok(Completed::success(out))
    }

    fn validate(args: &GetApplicationHistoryArgs) -> Result<()> {
        if !(1..=MAX_LIMIT).contains(&args.limit) {
            return Err(ServerError::McpInvalidRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {}",
                args.limit
            )));
        }
        Ok(())
    }
}

/// Handler for the `get_application_history` tool.
pub type GetApplicationHistoryHandler = StandardToolHandler<GetApplicationHistoryTool>;
