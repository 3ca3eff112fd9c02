use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use argocd_mcp::cli::{Cli, Commands, LogFormat, run_serve, run_show_config};
use argocd_mcp::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.env_file.as_deref()).with_context(|| match &cli.env_file {
        Some(path) => format!("Failed to load configuration with {}", path.display()),
        None => "Failed to load configuration from the environment".to_string(),
    })?;

    // stdout carries MCP messages; logs go to stderr. RUST_LOG wins over
    // the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    info!(
        instances = config.all_instances().len(),
        read_only = config.security.read_only,
        disable_destructive = config.security.disable_destructive,
        single_cluster = config.security.single_cluster,
        "Configuration loaded"
    );

    match cli.command {
        None | Some(Commands::Serve) => {
            run_serve(config).await.context("MCP server failed")?;
        }
        Some(Commands::ShowConfig) => {
            run_show_config(&config)?;
        }
    }

    Ok(())
}
