//! MCP Protocol Test Suite
//!
//! Drives `McpServer::handle_request` with raw JSON-RPC messages against
//! an in-memory ArgoCD backend, checking the wire shapes a client sees.

mod common;

use std::path::Path;
use std::sync::Arc;

use argocd_mcp::config::SecurityConfig;
use argocd_mcp::mcp::McpServer;
use argocd_mcp::mcp::protocol::{JsonRpcRequest, PROTOCOL_VERSION};
use argocd_mcp::ports::HttpMethod;
use serde_json::{Value, json};
use tempfile::TempDir;

use common::{FakeArgocd, audit_entries, context, permissive};

fn server(security: SecurityConfig, audit_log: Option<&Path>) -> (McpServer, Arc<FakeArgocd>) {
    let (ctx, fake) = context(security, audit_log);
    (McpServer::new(ctx), fake)
}

/// Send one raw message and return the serialized response, if any
async fn send(server: &McpServer, message: Value) -> Option<Value> {
    let request: JsonRpcRequest = serde_json::from_value(message).unwrap();
    server
        .handle_request(request)
        .await
        .map(|r| serde_json::to_value(r).unwrap())
}

async fn call_tool(server: &McpServer, id: i64, name: &str, arguments: Value) -> Value {
    send(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        }),
    )
    .await
    .unwrap()
}

fn tool_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

fn tool_is_error(response: &Value) -> bool {
    response["result"]["isError"].as_bool().unwrap_or(false)
}

// =============================================================================
// Request parsing
// =============================================================================

mod request_parsing {
    use super::*;

    #[test]
    fn test_parse_request_without_params() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "id": 2, "method": "tools/list"}"#).unwrap();
        assert_eq!(request.method, "tools/list");
        assert!(request.params.is_none());
    }

    #[test]
    fn test_parse_notification_without_id() {
        let request: JsonRpcRequest = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {"requestId": 5}}"#,
        )
        .unwrap();
        assert!(request.id.is_none());
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        assert!(serde_json::from_str::<JsonRpcRequest>("{ invalid json }").is_err());
    }
}

// =============================================================================
// Session lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_initialize_then_list_tools() {
        let (server, _fake) = server(SecurityConfig::default(), None);
        assert!(!server.is_initialized());

        let init = send(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": PROTOCOL_VERSION,
                    "clientInfo": {"name": "inspector", "version": "0.9"}
                }
            }),
        )
        .await
        .unwrap();

        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["result"]["serverInfo"]["name"], "argocd-mcp");
        assert!(init["result"]["capabilities"]["tools"].is_object());
        assert!(init["result"]["capabilities"]["resources"].is_object());
        assert!(server.is_initialized());

        let ack = send(
            &server,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(ack.is_none());

        let list = send(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await
            .unwrap();
        let tools = list["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 14);
        for tool in tools {
            assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
            assert!(tool["annotations"].is_object(), "{}", tool["name"]);
        }
    }

    #[tokio::test]
    async fn test_unknown_method_is_error() {
        let (server, _fake) = server(SecurityConfig::default(), None);
        let response = send(
            &server,
            json!({"jsonrpc": "2.0", "id": "abc", "method": "prompts/list"}),
        )
        .await
        .unwrap();

        assert_eq!(response["id"], "abc");
        assert_eq!(response["error"]["code"], -32601);
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_invalid_tool_params() {
        let (server, _fake) = server(SecurityConfig::default(), None);
        let response = send(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"arguments": {}}}),
        )
        .await
        .unwrap();

        assert_eq!(response["error"]["code"], -32602);
    }
}

// =============================================================================
// Tool calls
// =============================================================================

mod tool_calls {
    use super::*;

    #[tokio::test]
    async fn test_list_applications_renders_table() {
        let (server, fake) = server(SecurityConfig::default(), None);
        fake.respond(
            HttpMethod::Get,
            "/applications",
            json!({"items": [{
                "metadata": {"name": "guestbook"},
                "spec": {"project": "default"},
                "status": {"sync": {"status": "Synced"}, "health": {"status": "Healthy"}}
            }]}),
        );

        let response = call_tool(&server, 10, "list_applications", json!({})).await;

        assert!(!tool_is_error(&response));
        assert!(tool_text(&response).contains("guestbook"));
        assert_eq!(fake.calls_to(HttpMethod::Get, "/applications"), 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_error_result() {
        let (server, fake) = server(SecurityConfig::default(), None);

        let response = call_tool(&server, 11, "get_application_status", json!({})).await;

        assert!(response.get("error").is_none());
        assert!(tool_is_error(&response));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_instance_lists_configured_ones() {
        let (server, fake) = server(SecurityConfig::default(), None);

        let response = call_tool(
            &server,
            12,
            "get_application_status",
            json!({"name": "web", "instance": "staging"}),
        )
        .await;

        assert!(tool_is_error(&response));
        assert!(tool_text(&response).contains("Unknown instance 'staging'"));
        assert!(tool_text(&response).contains("primary"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_confirmation_round_trip() {
        let dir = TempDir::new().unwrap();
        let audit = dir.path().join("audit.jsonl");
        let (server, fake) = server(permissive(), Some(&audit));
        fake.respond(
            HttpMethod::Get,
            "/applications/web",
            json!({
                "metadata": {"name": "web", "namespace": "argocd"},
                "spec": {"destination": {"server": "https://kubernetes.default.svc"}}
            }),
        );

        let first = call_tool(&server, 20, "delete_application", json!({"name": "web"})).await;
        assert!(tool_is_error(&first));
        assert!(tool_text(&first).starts_with("CONFIRMATION REQUIRED: delete_application"));
        assert!(tool_text(&first).contains("confirm_name='web'"));
        assert_eq!(fake.calls_to(HttpMethod::Delete, "/applications/web"), 0);

        let second = call_tool(
            &server,
            21,
            "delete_application",
            json!({"name": "web", "confirm": true, "confirm_name": "web"}),
        )
        .await;
        assert!(!tool_is_error(&second));
        assert!(tool_text(&second).contains("deleted successfully"));
        assert_eq!(fake.calls_to(HttpMethod::Delete, "/applications/web"), 1);

        let entries = audit_entries(&audit);
        let outcomes: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| {
                (
                    e["correlation_id"].as_str().unwrap(),
                    e["result"].as_str().unwrap(),
                )
            })
            .collect();
        assert_eq!(outcomes, vec![("20", "blocked"), ("21", "deleted")]);
    }
}

// =============================================================================
// Resources
// =============================================================================

mod resources {
    use super::*;

    #[tokio::test]
    async fn test_security_resource_reflects_settings() {
        let (server, _fake) = server(
            SecurityConfig {
                single_cluster: true,
                ..permissive()
            },
            None,
        );

        let response = send(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 30,
                "method": "resources/read",
                "params": {"uri": "argocd://security"}
            }),
        )
        .await
        .unwrap();

        let content = &response["result"]["contents"][0];
        assert_eq!(content["uri"], "argocd://security");
        let text = content["text"].as_str().unwrap();
        assert!(text.contains("Read-only mode: false"));
        assert!(text.contains("Single cluster mode: true"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let (server, _fake) = server(SecurityConfig::default(), None);
        let response = send(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 31,
                "method": "resources/read",
                "params": {"uri": "file:///etc/passwd"}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["error"]["code"], -32602);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap()
                .contains("Unsupported resource scheme")
        );
    }
}
