//! Get Application Diff Tool Handler
//!
//! Compares the live and target state of every managed resource and groups
//! them into what a sync would create, update or prune.

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::resource_label;
use crate::argocd::{ArgocdClient, array_of};
use crate::error::Result;
use crate::mcp::standard_tool::{
    Completed, StandardTool, StandardToolHandler, default_instance, impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct GetApplicationDiffArgs {
    name: String,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(GetApplicationDiffArgs);

/// Resource states parsed from the managed-resources response
///
/// ArgoCD serializes the states as JSON strings; `"null"` means absent.
fn state(resource: &Value, key: &str) -> Option<Value> {
    match &resource[key] {
        Value::Null => None,
        Value::String(s) if s.is_empty() || s == "null" => None,
        Value::String(s) => Some(serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))),
        other => Some(other.clone()),
    }
}

#[derive(Debug, Default)]
struct DiffSummary {
    create: Vec<String>,
    update: Vec<String>,
    prune: Vec<String>,
    in_sync: usize,
}

impl DiffSummary {
    fn classify(resources: &[Value]) -> Self {
        let mut summary = Self::default();
        for res in resources {
            match (state(res, "liveState"), state(res, "targetState")) {
                (Some(_), None) => summary.prune.push(resource_label(res)),
                (None, Some(_)) => summary.create.push(resource_label(res)),
                (live, target) if live != target => summary.update.push(resource_label(res)),
                _ => summary.in_sync += 1,
            }
        }
        summary
    }

    fn has_changes(&self) -> bool {
        !(self.create.is_empty() && self.update.is_empty() && self.prune.is_empty())
    }
}

fn section(out: &mut String, title: &str, marker: char, labels: &[String]) {
    if labels.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title} ({}):", labels.len());
    for label in labels {
        let _ = writeln!(out, "  {marker} {label}");
    }
    out.push('\n');
}

pub struct GetApplicationDiffTool;

#[async_trait]
impl StandardTool for GetApplicationDiffTool {
    type Args = GetApplicationDiffArgs;

    const NAME: &'static str = "get_application_diff";

    const DESCRIPTION: &'static str = "Show what a sync would change: resources to create, \
        update, or delete with prune, plus the count already in sync. Optionally diff \
        against a specific Git revision. Run this before sync_application.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Application name"
            },
            "revision": {
                "type": "string",
                "description": "Target revision to diff against"
            },
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": ["name"]
    }"#;

    async fn run(args: &GetApplicationDiffArgs, client: &ArgocdClient) -> Result<Completed> {
        let data = client
            .get_application_diff(&args.name, args.revision.as_deref())
            .await?;
        let resources = array_of(&data["items"]);
        if resources.is_empty() {
            return Ok(Completed::success(format!(
                "No managed resources found for application '{}'",
                args.name
            )));
        }

        let summary = DiffSummary::classify(&resources);
        let mut out = format!("Diff for application '{}':\n\n", args.name);
        section(&mut out, "Resources to CREATE", '+', &summary.create);
        section(&mut out, "Resources to UPDATE", '~', &summary.update);
        section(&mut out, "Resources to DELETE (with prune)", '-', &summary.prune);
        let _ = write!(out, "Resources in sync: {}", summary.in_sync);
        if !summary.has_changes() {
            out.push_str("\n\nApplication is fully synced. No changes needed.");
        }
        Ok(Completed::success(out))
    }
}

/// Handler for the `get_application_diff` tool.
pub type GetApplicationDiffHandler = StandardToolHandler<GetApplicationDiffTool>;
