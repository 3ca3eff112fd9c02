//! Tool Registry
//!
//! This module provides a registry for tool handlers, enabling
//! dynamic registration and lookup of tools at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::error::{Result, ServerError};
use crate::mcp::protocol::{Tool, ToolAnnotations, ToolCallResult};
#[cfg(test)]
use crate::ports::ToolSchema;
use crate::ports::{ToolContext, ToolHandler};

/// Registry for tool handlers
///
/// The registry maintains a collection of tool handlers and provides
/// methods for registering, looking up, and listing available tools.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a tool handler
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.name().to_string();
        self.handlers.insert(name, handler);
    }

    /// Get a tool handler by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Execute a tool by name
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is not found or if the tool execution fails.
    pub async fn execute(
        &self,
        tool_name: &str,
        args: Option<serde_json::Value>,
        ctx: &ToolContext,
    ) -> Result<ToolCallResult> {
        let handler = self
            .get(tool_name)
            .ok_or_else(|| ServerError::McpUnknownTool {
                tool: tool_name.to_string(),
            })?;

        handler.execute(args, ctx).await
    }

    /// Get all registered tools as MCP Tool definitions, sorted by name
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self
            .handlers
            .values()
            .map(|handler| {
                let schema = handler.schema();
                Tool {
                    name: schema.name.to_string(),
                    description: schema.description.to_string(),
                    input_schema: serde_json::from_str(schema.input_schema)
                        .unwrap_or_else(|_| json!({})),
                    annotations: tool_annotations(schema.name),
                }
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get the number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Return MCP annotations for a tool.
///
/// Clients use `readOnlyHint` to skip confirmation dialogs and
/// `destructiveHint` to insist on one. Unknown tools get no annotations.
#[must_use]
pub fn tool_annotations(tool_name: &str) -> Option<ToolAnnotations> {
    let annotations = match tool_name {
        "list_applications" => ToolAnnotations::read_only("List Applications"),
        "get_application" => ToolAnnotations::read_only("Application Details"),
        "get_application_status" => ToolAnnotations::read_only("Application Status"),
        "get_application_diff" => ToolAnnotations::read_only("Application Diff"),
        "get_application_history" => ToolAnnotations::read_only("Deployment History"),
        "diagnose_sync_failure" => ToolAnnotations::read_only("Diagnose Sync Failure"),
        "get_application_logs" => ToolAnnotations::read_only("Application Logs"),
        "list_clusters" => ToolAnnotations::read_only("List Clusters"),
        "list_projects" => ToolAnnotations::read_only("List Projects"),

        "sync_application" => ToolAnnotations::mutating("Sync Application"),
        "refresh_application" => ToolAnnotations::mutating("Refresh Application"),
        "rollback_application" => ToolAnnotations::mutating("Rollback Application"),
        "terminate_sync" => ToolAnnotations::mutating("Terminate Sync"),

        "delete_application" => ToolAnnotations::destructive("Delete Application"),

        _ => return None,
    };
    Some(annotations)
}

/// Create a registry with every ArgoCD tool registered
#[must_use]
pub fn create_default_registry() -> ToolRegistry {
    use super::tool_handlers::{
        DeleteApplicationHandler, DiagnoseSyncFailureHandler, GetApplicationDiffHandler,
        GetApplicationHandler, GetApplicationHistoryHandler, GetApplicationLogsHandler,
        GetApplicationStatusHandler, ListApplicationsHandler, ListClustersHandler,
        ListProjectsHandler, RefreshApplicationHandler, RollbackApplicationHandler,
        SyncApplicationHandler, TerminateSyncHandler,
    };

    let handlers: [Arc<dyn ToolHandler>; 14] = [
        // Read
        Arc::new(ListApplicationsHandler::new()),
        Arc::new(GetApplicationHandler::new()),
        Arc::new(GetApplicationStatusHandler::new()),
        Arc::new(GetApplicationDiffHandler::new()),
        Arc::new(GetApplicationHistoryHandler::new()),
        Arc::new(DiagnoseSyncFailureHandler::new()),
        Arc::new(GetApplicationLogsHandler::new()),
        Arc::new(ListClustersHandler::new()),
        Arc::new(ListProjectsHandler::new()),
        // Write
        Arc::new(SyncApplicationHandler::new()),
        Arc::new(RefreshApplicationHandler::new()),
        Arc::new(RollbackApplicationHandler::new()),
        Arc::new(TerminateSyncHandler::new()),
        // Destructive
        Arc::new(DeleteApplicationHandler::new()),
    ];

    let mut registry = ToolRegistry::new();
    for handler in handlers {
        registry.register(handler);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::ports::mock::create_test_context;
    use async_trait::async_trait;

    struct TestHandler;

    #[async_trait]
    impl ToolHandler for TestHandler {
        fn name(&self) -> &'static str {
            "test_tool"
        }

        fn description(&self) -> &'static str {
            "A test tool"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "test_tool",
                description: "A test tool",
                input_schema: r#"{"type": "object", "properties": {}}"#,
            }
        }

        async fn execute(
            &self,
            _args: Option<serde_json::Value>,
            _ctx: &ToolContext,
        ) -> Result<ToolCallResult> {
            Ok(ToolCallResult::text("test result"))
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(TestHandler));

        assert!(registry.get("test_tool").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_list_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(TestHandler));

        let tools = registry.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "test_tool");
        assert!(tools[0].annotations.is_none());
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);

        registry.register(Arc::new(TestHandler));
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let (ctx, _) = create_test_context(SecurityConfig::default());
        let result = registry.execute("nope", None, &ctx).await;
        match result {
            Err(ServerError::McpUnknownTool { tool }) => assert_eq!(tool, "nope"),
            other => panic!("Expected McpUnknownTool, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(TestHandler));
        let (ctx, _) = create_test_context(SecurityConfig::default());

        let result = registry.execute("test_tool", None, &ctx).await.unwrap();
        assert_eq!(result.text_content(), "test result");
    }

    // ============== Default registry ==============

    #[test]
    fn test_default_registry_has_every_tool() {
        let registry = create_default_registry();
        assert_eq!(registry.len(), 14);

        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.iter().all(|n| tool_annotations(n).is_some()));
    }

    #[test]
    fn test_default_schemas_are_valid_objects() {
        for tool in create_default_registry().list_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"]["instance"].is_object(), "{}", tool.name);
        }
    }

    #[test]
    fn test_annotation_categories() {
        let get = |name: &str| tool_annotations(name).unwrap();

        assert_eq!(get("list_applications").read_only_hint, Some(true));
        assert_eq!(get("diagnose_sync_failure").read_only_hint, Some(true));
        assert_eq!(get("sync_application").read_only_hint, Some(false));
        assert_eq!(get("sync_application").destructive_hint, Some(false));
        assert_eq!(get("delete_application").destructive_hint, Some(true));
        assert!(tool_annotations("kubectl_exec").is_none());
    }
}
