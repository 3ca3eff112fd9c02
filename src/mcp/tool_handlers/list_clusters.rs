//! List Clusters Tool Handler

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
pub struct ListClustersArgs {
    #[serde(default = "default_instance")]
    instance: String,
}

impl_common_args!(ListClustersArgs, ALL_TARGETS);

pub struct ListClustersTool;

#[async_trait]
impl StandardTool for ListClustersTool {
    type Args = ListClustersArgs;

    const NAME: &'static str = "list_clusters";

    const DESCRIPTION: &'static str = "List the Kubernetes clusters registered in ArgoCD \
        with their API server and connection status.";

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

    async fn run(_args: &ListClustersArgs, client: &ArgocdClient) -> Result<Completed> {
        let clusters = client.list_clusters().await?;
        if clusters.is_empty() {
            return Ok(Completed::success("No clusters registered"));
        }

        let mut out = format!("Found {} cluster(s):\n", clusters.len());
        for cluster in &clusters {
            let server = str_or(&cluster["server"], "unknown");
            let _ = write!(
                out,
                "\n- {}: {} [{}]",
                str_or(&cluster["name"], "unknown"),
                truncate_chars(&server, 50),
                str_or(&cluster["connectionState"]["status"], "Unknown"),
            );
        }
        Ok(Completed::success(out))
    }
}

/// Handler for the `list_clusters` tool.
pub type ListClustersHandler = StandardToolHandler<ListClustersTool>;
