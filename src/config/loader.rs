use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};
use zeroize::Zeroizing;

use super::types::{
    ArgocdInstance, Config, ENV_AUDIT_LOG, ENV_DISABLE_DESTRUCTIVE, ENV_MASK_SECRETS,
    ENV_RATE_LIMIT_CALLS, ENV_RATE_LIMIT_WINDOW, ENV_READ_ONLY, ENV_SINGLE_CLUSTER, LogLevel,
    SecurityConfig, normalize_url,
};
use crate::error::{Result, ServerError};

/// Environment variable pointing at an optional `.env` style file
pub const ENV_FILE_VAR: &str = "ARGOCD_MCP_ENV_FILE";

const ENV_ARGOCD_URL: &str = "ARGOCD_URL";
const ENV_ARGOCD_TOKEN: &str = "ARGOCD_TOKEN";
const ENV_ARGOCD_INSECURE: &str = "ARGOCD_INSECURE";
const ENV_ADDITIONAL_INSTANCES: &str = "ARGOCD_MCP_ADDITIONAL_INSTANCES";
const ENV_SERVER_NAME: &str = "ARGOCD_MCP_SERVER_NAME";
const ENV_SERVER_VERSION: &str = "ARGOCD_MCP_SERVER_VERSION";
const ENV_LOG_LEVEL: &str = "ARGOCD_MCP_LOG_LEVEL";

/// Load configuration from the process environment
///
/// If `env_file` is given (or `ARGOCD_MCP_ENV_FILE` is set), the file is
/// read first; variables already present in the environment win.
///
/// # Errors
///
/// Returns an error if the env file cannot be read or any variable fails
/// validation.
pub fn load_config(env_file: Option<&Path>) -> Result<Config> {
    let env_file = env_file
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(ENV_FILE_VAR).map(PathBuf::from));

    if let Some(path) = env_file {
        dotenvy::from_path(&path).map_err(|e| ServerError::ConfigInvalid {
            field: ENV_FILE_VAR.to_string(),
            reason: format!("cannot load {}: {e}", path.display()),
        })?;
        info!(path = %path.display(), "Loaded environment file");
    }

    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build a [`Config`] from an arbitrary variable lookup
///
/// # Errors
///
/// Returns [`ServerError::ConfigInvalid`] naming the offending variable.
pub fn config_from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = SecurityConfig::default();
    let security = SecurityConfig {
        read_only: parse_var(&lookup, ENV_READ_ONLY, parse_bool)?.unwrap_or(defaults.read_only),
        disable_destructive: parse_var(&lookup, ENV_DISABLE_DESTRUCTIVE, parse_bool)?
            .unwrap_or(defaults.disable_destructive),
        single_cluster: parse_var(&lookup, ENV_SINGLE_CLUSTER, parse_bool)?
            .unwrap_or(defaults.single_cluster),
        audit_log: non_empty(&lookup, ENV_AUDIT_LOG).map(PathBuf::from),
        mask_secrets: parse_var(&lookup, ENV_MASK_SECRETS, parse_bool)?
            .unwrap_or(defaults.mask_secrets),
        rate_limit_calls: parse_var(&lookup, ENV_RATE_LIMIT_CALLS, parse_number)?
            .unwrap_or(defaults.rate_limit_calls),
        rate_limit_window: parse_var(&lookup, ENV_RATE_LIMIT_WINDOW, parse_number)?
            .unwrap_or(defaults.rate_limit_window),
    };

    let additional_instances = match non_empty(&lookup, ENV_ADDITIONAL_INSTANCES) {
        Some(raw) => parse_instances(&raw)?,
        None => Vec::new(),
    };

    let log_level = match non_empty(&lookup, ENV_LOG_LEVEL) {
        Some(raw) => LogLevel::parse(&raw).ok_or_else(|| ServerError::ConfigInvalid {
            field: ENV_LOG_LEVEL.to_string(),
            reason: format!("'{raw}' is not one of DEBUG, INFO, WARNING, ERROR, CRITICAL"),
        })?,
        None => LogLevel::default(),
    };

    let defaults = Config::default();
    let config = Config {
        argocd_url: non_empty(&lookup, ENV_ARGOCD_URL)
            .map(|u| normalize_url(&u))
            .unwrap_or_default(),
        argocd_token: Zeroizing::new(lookup(ENV_ARGOCD_TOKEN).unwrap_or_default()),
        argocd_insecure: parse_var(&lookup, ENV_ARGOCD_INSECURE, parse_bool)?.unwrap_or(false),
        additional_instances,
        server_name: non_empty(&lookup, ENV_SERVER_NAME).unwrap_or(defaults.server_name),
        server_version: non_empty(&lookup, ENV_SERVER_VERSION).unwrap_or(defaults.server_version),
        log_level,
        security,
    };

    validate_config(&config)?;

    debug!(
        instances = config.all_instances().len(),
        read_only = config.security.read_only,
        "Configuration parsed"
    );

    Ok(config)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str, parse: fn(&str) -> Option<T>) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key)
        .map(|raw| {
            parse(&raw).ok_or_else(|| ServerError::ConfigInvalid {
                field: key.to_string(),
                reason: format!("cannot parse '{raw}'"),
            })
        })
        .transpose()
}

/// Accepts true/false, 1/0, yes/no, on/off (case-insensitive)
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "off" | "n" | "f" => Some(false),
        _ => None,
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

fn parse_instances(raw: &str) -> Result<Vec<ArgocdInstance>> {
    let mut instances: Vec<ArgocdInstance> =
        serde_json::from_str(raw).map_err(|e| ServerError::ConfigInvalid {
            field: ENV_ADDITIONAL_INSTANCES.to_string(),
            reason: format!("expected a JSON array of instances: {e}"),
        })?;

    for instance in &mut instances {
        instance.url = normalize_url(&instance.url);
    }
    Ok(instances)
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.security.rate_limit_calls == 0 {
        return Err(ServerError::ConfigInvalid {
            field: ENV_RATE_LIMIT_CALLS.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if config.security.rate_limit_window == 0 {
        return Err(ServerError::ConfigInvalid {
            field: ENV_RATE_LIMIT_WINDOW.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for instance in config.all_instances() {
        if instance.url.trim_start_matches("https://").is_empty() {
            return Err(ServerError::ConfigInvalid {
                field: format!("instances.{}.url", instance.name),
                reason: "URL cannot be empty".to_string(),
            });
        }
        if !seen.insert(instance.name.clone()) {
            return Err(ServerError::ConfigInvalid {
                field: ENV_ADDITIONAL_INSTANCES.to_string(),
                reason: format!("duplicate instance name '{}'", instance.name),
            });
        }
    }

    Ok(())
}
