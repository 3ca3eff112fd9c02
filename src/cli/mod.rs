//! Command-line interface
//!
//! Without a subcommand the binary serves MCP over stdio.

mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use runner::{run_serve, run_show_config, show_config};

/// ArgoCD MCP server - safety-gated GitOps operations for AI assistants
#[derive(Parser, Debug)]
#[command(name = "argocd-mcp")]
#[command(about = "MCP server for ArgoCD with read-only defaults and audited writes")]
#[command(version)]
#[command(after_help = "EXAMPLES:
    # Start MCP server (default mode)
    ARGOCD_URL=https://argocd.example.com ARGOCD_TOKEN=... argocd-mcp

    # Load settings from a file
    argocd-mcp --env-file ./argocd-mcp.env

    # Show the effective instances and security settings
    argocd-mcp show-config")]
pub struct Cli {
    /// Read environment variables from this file before the process environment
    #[arg(long, global = true, env = "ARGOCD_MCP_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Log output format (logs always go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start MCP server (JSON-RPC over stdio) - same as running without arguments
    Serve,

    /// Print configured instances and security settings, without tokens
    ShowConfig,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["argocd-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_show_config_with_options() {
        let cli = Cli::try_parse_from([
            "argocd-mcp",
            "show-config",
            "--env-file",
            "/etc/argocd-mcp.env",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::ShowConfig));
        assert_eq!(cli.env_file, Some(PathBuf::from("/etc/argocd-mcp.env")));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["argocd-mcp", "--log-format", "xml"]).is_err());
    }
}
