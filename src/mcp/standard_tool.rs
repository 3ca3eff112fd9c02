//! Standard Tool Handler
//!
//! Generic handler implementing the gated pipeline shared by every read
//! tool and the simple write tools. Each standard tool only defines its
//! args struct, schema, and `run` function against an [`ArgocdClient`].

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::argocd::ArgocdClient;
use crate::error::{Result, ServerError};
use crate::mcp::protocol::ToolCallResult;
use crate::ports::{ToolContext, ToolHandler, ToolSchema};
use crate::security::OperationBlocked;

/// Audit target for calls that are not about a single application
pub const ALL_TARGETS: &str = "all";

/// Trait for accessing the fields every tool argument struct carries.
pub trait CommonArgs {
    /// ArgoCD instance name (default `primary`).
    fn instance(&self) -> &str;
    /// Target recorded in the audit trail.
    fn target(&self) -> String;
}

/// Implement [`CommonArgs`] for a struct with `instance: String` and
/// either a `name: String` field or a fixed audit target.
macro_rules! impl_common_args {
    ($type:ty) => {
        impl $crate::mcp::standard_tool::CommonArgs for $type {
            fn instance(&self) -> &str {
                &self.instance
            }
            fn target(&self) -> String {
                self.name.clone()
            }
        }
    };
    ($type:ty, $target:expr) => {
        impl $crate::mcp::standard_tool::CommonArgs for $type {
            fn instance(&self) -> &str {
                &self.instance
            }
            fn target(&self) -> String {
                $target.to_string()
            }
        }
    };
}
pub(crate) use impl_common_args;

/// `serde(default)` helper for the `instance` argument
pub fn default_instance() -> String {
    crate::config::PRIMARY_INSTANCE.to_string()
}

/// Which `SafetyGuard` check a standard tool goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Read,
    Write,
}

/// What a successful run hands back to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub text: String,
    /// Audit result (`success`, `dry_run`, `initiated`, ...)
    pub result: &'static str,
    pub details: Option<Map<String, Value>>,
}

impl Completed {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_result(text, "success")
    }

    #[must_use]
    pub fn with_result(text: impl Into<String>, result: &'static str) -> Self {
        Self {
            text: text.into(),
            result,
            details: None,
        }
    }

    #[must_use]
    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Trait for tools that follow the standard execution pipeline.
///
/// The pipeline is: parse args → validate → guard check → (on denial:
/// audit `blocked`, return the rendered denial) → client lookup → run →
/// audit the outcome → return.
#[async_trait]
pub trait StandardTool: Send + Sync + 'static {
    type Args: DeserializeOwned + Send + Sync + CommonArgs;

    /// Tool name, also the operation name given to the guard.
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const SCHEMA: &'static str;
    const GATE: Gate = Gate::Read;

    /// Talk to ArgoCD and render the result.
    async fn run(args: &Self::Args, client: &ArgocdClient) -> Result<Completed>;

    /// Argument checks the JSON schema cannot express.
    fn validate(_args: &Self::Args) -> Result<()> {
        Ok(())
    }

    /// Target recorded when the call succeeds.
    fn success_target(args: &Self::Args) -> String {
        args.target()
    }
}

/// Generic handler that wraps a [`StandardTool`] and implements [`ToolHandler`].
pub struct StandardToolHandler<T: StandardTool>(PhantomData<T>);

impl<T: StandardTool> Default for StandardToolHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StandardTool> StandardToolHandler<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<T: StandardTool> ToolHandler for StandardToolHandler<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn description(&self) -> &'static str {
        T::DESCRIPTION
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: T::NAME,
            description: T::DESCRIPTION,
            input_schema: T::SCHEMA,
        }
    }

    async fn execute(&self, args: Option<Value>, ctx: &ToolContext) -> Result<ToolCallResult> {
        let args: T::Args = parse_args(args)?;
        T::validate(&args)?;
        let target = args.target();

        let blocked = match T::GATE {
            Gate::Read => ctx.guard.check_read_operation(T::NAME),
            Gate::Write => ctx.guard.check_write_operation(T::NAME),
        };
        if let Some(blocked) = blocked {
            return deny_blocked(ctx, T::NAME, &target, &blocked);
        }

        let client = ctx.client(args.instance())?;
        info!(tool = T::NAME, instance = args.instance(), target = %target, "Executing tool");

        match T::run(&args, client).await {
            Ok(done) => {
                ctx.audit
                    .log(T::NAME, &T::success_target(&args), done.result, done.details)?;
                Ok(ToolCallResult::text(done.text))
            }
            Err(e) => backend_failure(ctx, T::NAME, &target, e),
        }
    }
}

/// Deserialize tool arguments
///
/// # Errors
///
/// Returns `McpMissingParam` when absent and `McpInvalidRequest` when they
/// do not match the expected shape.
pub fn parse_args<A: DeserializeOwned>(args: Option<Value>) -> Result<A> {
    let Some(v) = args else {
        return Err(ServerError::McpMissingParam {
            param: "arguments".to_string(),
        });
    };
    serde_json::from_value(v).map_err(|e| ServerError::McpInvalidRequest(e.to_string()))
}

/// Record a guard denial and render it for the caller
///
/// # Errors
///
/// Returns an error if the audit entry cannot be written.
pub fn deny(
    ctx: &ToolContext,
    action: &str,
    target: &str,
    reason: &str,
    message: String,
) -> Result<ToolCallResult> {
    warn!(tool = action, target = %target, reason, "Operation denied");
    ctx.audit.log_blocked(action, target, reason)?;
    Ok(ToolCallResult::error(message))
}

/// [`deny`] for an [`OperationBlocked`]
///
/// # Errors
///
/// Returns an error if the audit entry cannot be written.
pub fn deny_blocked(
    ctx: &ToolContext,
    action: &str,
    target: &str,
    blocked: &OperationBlocked,
) -> Result<ToolCallResult> {
    deny(ctx, action, target, &blocked.reason, blocked.format_message())
}

/// Deny the call when single-cluster mode forbids the application's destination
///
/// Fetches the application only when single-cluster mode is on. Returns the
/// rendered denial (or backend failure) the caller should hand back.
///
/// # Errors
///
/// Returns an error if the audit entry cannot be written.
pub async fn deny_foreign_cluster(
    ctx: &ToolContext,
    client: &ArgocdClient,
    action: &str,
    name: &str,
) -> Result<Option<ToolCallResult>> {
    if !ctx.guard.security().single_cluster {
        return Ok(None);
    }
    let app = match client.get_application(name).await {
        Ok(app) => app,
        Err(e) => return backend_failure(ctx, action, name, e).map(Some),
    };
    match ctx
        .guard
        .check_cluster_operation(action, app.destination_cluster())
    {
        Some(blocked) => deny_blocked(ctx, action, name, &blocked).map(Some),
        None => Ok(None),
    }
}

/// Turn an ArgoCD failure into an error result after auditing it
///
/// Non-backend errors propagate unchanged.
///
/// # Errors
///
/// Returns `error` itself when it is not a backend failure, or the audit
/// write error.
pub fn backend_failure(
    ctx: &ToolContext,
    action: &str,
    target: &str,
    error: ServerError,
) -> Result<ToolCallResult> {
    if !error.is_backend() {
        return Err(error);
    }
    let message = error.to_string();
    warn!(tool = action, target = %target, error = %message, "ArgoCD call failed");
    ctx.audit.log_error(action, target, &message)?;
    Ok(ToolCallResult::error(message))
}
