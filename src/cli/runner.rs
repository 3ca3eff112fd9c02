//! CLI runner functions

use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::mcp::McpServer;
use crate::mcp::resources::{render_instances, render_security};

/// Serve MCP over stdio until the client disconnects
///
/// # Errors
///
/// Returns an error if the server cannot be built from `config` or stdin
/// fails.
pub async fn run_serve(config: Config) -> Result<()> {
    let server = Arc::new(McpServer::from_config(config)?);
    server.run().await?;
    info!("Server stopped");
    Ok(())
}

/// Print [`show_config`] to stdout
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run_show_config(config: &Config) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", show_config(config))?;
    Ok(())
}

/// Human-readable summary of the effective configuration, tokens omitted
#[must_use]
pub fn show_config(config: &Config) -> String {
    format!(
        "{} {}\nLog level: {}\n\n{}\n\n{}",
        config.server_name,
        config.server_version,
        config.log_level.as_filter(),
        render_instances(config),
        render_security(&config.security),
    )
}
