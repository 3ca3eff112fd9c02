//! List Projects Tool Handler

use std::fmt::Write;

use async_trait::async_trait;
use serde::Deserialize;

use super::utils::truncate_chars;
use crate::argocd::{ArgocdClient, str_or};
use crate::error::Result;
use crate::mcp::standard_tool::{
    ALL_TARGETS, Completed, StandardTool, StandardToolHandler, default_instance,
    impl_common_args,
};

#[derive(Debug, Deserialize)]
pub struct ListProjectsArgs {
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(ListProjectsArgs, ALL_TARGETS);

pub struct ListProjectsTool;

#[async_trait]
impl StandardTool for ListProjectsTool {
    type Args = ListProjectsArgs;

    const NAME: &'static str = "list_projects";

    const DESCRIPTION: &'static str = "List ArgoCD projects with their descriptions.";

    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "instance": {
                "type": "string",
                "description": "ArgoCD instance name (default: primary)"
            }
        },
        "required": []
    }"#;

    async fn run(_args: &ListProjectsArgs, client: &ArgocdClient) -> Result<Completed> {
        let projects = client.list_projects().await?;
        if projects.is_empty() {
            return Ok(Completed::success("No projects found"));
        }

        let mut out = format!("Found {} project(s):\n", projects.len());
        for project in &projects {
            let description = str_or(&project["spec"]["description"], "No description");
            let _ = write!(
                out,
                "\n- {}: {}",
                str_or(&project["metadata"]["name"], "unknown"),
                truncate_chars(&description, 60),
            );
        }
        Ok(Completed::success(out))
    }
}

/// Handler for the `list_projects` tool.
pub type ListProjectsHandler = StandardToolHandler<ListProjectsTool>;
