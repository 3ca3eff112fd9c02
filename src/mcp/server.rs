use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{RwLock, Semaphore, mpsc};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::Config;
use crate::error::Result;
use crate::ports::ToolContext;
use crate::security::{correlation_id, with_correlation_id};

use super::protocol::{
    ClientInfo, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ResourcesCapability, ResourcesListResult, ResourcesReadParams,
    ResourcesReadResult, ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult,
    ToolsCapability, ToolsListResult, negotiate_protocol_version,
};
use super::registry::{ToolRegistry, create_default_registry};
use super::resource_registry::{ResourceRegistry, create_default_resource_registry};

/// Requests served concurrently before the reader waits
pub const MAX_CONCURRENT_REQUESTS: usize = 16;

const INSTRUCTIONS: &str = "ArgoCD MCP server for inspecting and operating GitOps \
    applications. Start with list_applications, then get_application_status or \
    diagnose_sync_failure to investigate problems. Write tools (sync_application, \
    rollback_application) default to dry_run=true; preview before applying. \
    Destructive operations need confirm=true and confirm_name set to the application \
    name. Read argocd://security to see which operations the server allows.";

/// MCP Server that communicates over stdio
pub struct McpServer {
    ctx: ToolContext,
    registry: ToolRegistry,
    resource_registry: ResourceRegistry,
    initialized: AtomicBool,
    concurrent_limit: Arc<Semaphore>,
    client_info: RwLock<Option<ClientInfo>>,
}

impl McpServer {
    /// Create a server around an existing tool context
    #[must_use]
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            ctx,
            registry: create_default_registry(),
            resource_registry: create_default_resource_registry(),
            initialized: AtomicBool::new(false),
            concurrent_limit: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
            client_info: RwLock::new(None),
        }
    }

    /// Create a server with an HTTP client per configured instance
    ///
    /// # Errors
    ///
    /// Returns an error if the security settings or an instance's HTTP
    /// client cannot be set up.
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(Self::new(ToolContext::from_config(config)?))
    }

    /// Whether an `initialize` request has been handled
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Client name and version from the last `initialize`
    pub async fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().await.clone()
    }

    /// Run the server, reading from stdin and writing to stdout
    ///
    /// Requests are served on their own tasks, at most
    /// [`MAX_CONCURRENT_REQUESTS`] at a time. A single writer task owns
    /// stdout so responses never interleave.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<JsonRpcResponse>(100);

        let writer_handle = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(response) = rx.recv().await {
                let json_str = match serde_json::to_string(&response) {
                    Ok(s) => s,
                    Err(e) => {
                        error!(error = %e, "Failed to serialize message");
                        continue;
                    }
                };
                debug!(message = %json_str, "Sending message");

                if let Err(e) = stdout.write_all(json_str.as_bytes()).await {
                    error!(error = %e, "Failed to write message");
                    break;
                }
                if let Err(e) = stdout.write_all(b"\n").await {
                    error!(error = %e, "Failed to write newline");
                    break;
                }
                if let Err(e) = stdout.flush().await {
                    error!(error = %e, "Failed to flush stdout");
                    break;
                }
            }
        });

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        info!(
            server = %self.ctx.config.server_name,
            instances = ?self.ctx.clients.names(),
            "ArgoCD MCP server starting"
        );

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                info!("Client disconnected, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let request = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(req) => req,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    let response = JsonRpcResponse::error(
                        None,
                        JsonRpcError::parse_error(format!("Invalid JSON: {e}")),
                    );
                    let _ = tx.send(response).await;
                    continue;
                }
            };

            let Ok(permit) = Arc::clone(&self.concurrent_limit).acquire_owned().await else {
                error!("Semaphore closed unexpectedly");
                break;
            };

            let server = Arc::clone(&self);
            let tx = tx.clone();

            tokio::spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    let _ = tx.send(response).await;
                }
                drop(permit);
            });
        }

        drop(tx);
        let _ = writer_handle.await;

        Ok(())
    }

    /// Route one JSON-RPC message
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params).await,
            "initialized" | "notifications/initialized" => {
                debug!("Client initialization complete");
                return None;
            }
            method if method.starts_with("notifications/") => {
                debug!(method, "Ignoring notification");
                return None;
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => self.handle_resources_list(id).await,
            "resources/read" => self.handle_resources_read(id, request.params).await,
            _ => {
                warn!(method = %request.method, "Unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method))
            }
        };
        Some(response)
    }

    async fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let mut requested = None;

        if let Some(p) = params {
            match serde_json::from_value::<InitializeParams>(p) {
                Ok(init_params) => {
                    if let Some(client) = &init_params.client_info {
                        info!(
                            client = %client.name,
                            version = %client.version,
                            protocol = ?init_params.protocol_version,
                            "Client connected"
                        );
                    }
                    requested = init_params.protocol_version;
                    *self.client_info.write().await = init_params.client_info;
                }
                Err(e) => {
                    debug!(error = %e, "Could not parse initialize params (continuing anyway)");
                }
            }
        }

        self.initialized.store(true, Ordering::SeqCst);

        let result = InitializeResult {
            protocol_version: negotiate_protocol_version(requested.as_deref()).to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                resources: ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: self.ctx.config.server_name.clone(),
                version: self.ctx.config.server_version.clone(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        JsonRpcResponse::success_or_serialize_error(id, &result)
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.registry.list_tools(),
        };

        JsonRpcResponse::success_or_serialize_error(id, &result)
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
        };

        let call_params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid params: {e}")),
                );
            }
        };

        let request_id = id.as_ref().map(request_id_string);
        let result = with_correlation_id(request_id, async {
            let span = info_span!(
                "tool_call",
                tool = %call_params.name,
                correlation_id = %correlation_id()
            );
            self.call_tool(call_params.name.as_str(), call_params.arguments)
                .instrument(span)
                .await
        })
        .await;

        JsonRpcResponse::success_or_serialize_error(id, &result)
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        info!("Tool call");
        match self.registry.execute(name, arguments, &self.ctx).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }

    async fn handle_resources_list(&self, id: Option<Value>) -> JsonRpcResponse {
        match self.resource_registry.list(&self.ctx).await {
            Ok(resources) => {
                let result = ResourcesListResult { resources };
                JsonRpcResponse::success_or_serialize_error(id, &result)
            }
            Err(e) => {
                error!(error = %e, "Resources list failed");
                JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string()))
            }
        }
    }

    async fn handle_resources_read(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
        };

        let read_params: ResourcesReadParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid params: {e}")),
                );
            }
        };

        info!(uri = %read_params.uri, "Resource read");

        match self.resource_registry.read(&read_params.uri, &self.ctx).await {
            Ok(contents) => {
                let result = ResourcesReadResult { contents };
                JsonRpcResponse::success_or_serialize_error(id, &result)
            }
            Err(e) => {
                error!(error = %e, "Resource read failed");
                JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string()))
            }
        }
    }
}

/// JSON-RPC ids become correlation ids: strings as-is, numbers as digits
fn request_id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
