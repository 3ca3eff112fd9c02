//! Security resource: the effective safety settings

use crate::config::SecurityConfig;

pub const SECURITY_URI: &str = "argocd://security";

#[must_use]
pub fn render(security: &SecurityConfig) -> String {
    format!(
        "Security Settings:\n  \
         Read-only mode: {}\n  \
         Destructive operations disabled: {}\n  \
         Single cluster mode: {}\n  \
         Secret masking: {}\n  \
         Audit log: {}\n  \
         Rate limit: {} calls per {}s",
        security.read_only,
        security.disable_destructive,
        security.single_cluster,
        security.mask_secrets,
        security
            .audit_log
            .as_ref()
            .map_or_else(|| "disabled".to_string(), |p| p.display().to_string()),
        security.rate_limit_calls,
        security.rate_limit_window,
    )
}
