//! The authorization chokepoint every tool call passes through

use std::sync::Arc;

use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::verdict::{ConfirmationRequired, OperationBlocked, SafetyDenial};
use crate::config::{
    ENV_DISABLE_DESTRUCTIVE, ENV_RATE_LIMIT_CALLS, ENV_READ_ONLY, ENV_SINGLE_CLUSTER,
    SecurityConfig,
};
use crate::error::Result;

/// Cluster identity of the cluster the server itself runs in
pub const IN_CLUSTER: &str = "in-cluster";

const RATE_LIMIT_REASON: &str = "Rate limit exceeded";
const READ_ONLY_REASON: &str = "Server is running in read-only mode";
const DESTRUCTIVE_DISABLED_REASON: &str = "Destructive operations are disabled";

const DEFAULT_IMPACT: &str = "This operation may have significant impact";

const IMPACTS: &[(&str, &str)] = &[
    (
        "delete_application",
        "Application and all managed resources will be PERMANENTLY DELETED",
    ),
    (
        "sync_with_prune",
        "Resources not in Git will be DELETED from cluster",
    ),
    (
        "sync_with_force",
        "Resources will be replaced, potentially causing downtime",
    ),
    (
        "rollback",
        "Application will revert to previous state, may cause service disruption",
    ),
];

/// Consequence description shown when confirmation is required
#[must_use]
pub fn impact_description(operation: &str) -> &'static str {
    IMPACTS
        .iter()
        .find(|(op, _)| *op == operation)
        .map_or(DEFAULT_IMPACT, |(_, impact)| impact)
}

/// Layered authorization: permission flags, rate limits, confirmation
pub struct SafetyGuard {
    security: Arc<SecurityConfig>,
    rate_limiter: RateLimiter,
}

impl SafetyGuard {
    /// Create a guard and its rate limiter from the security settings
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit settings are zero.
    pub fn new(security: Arc<SecurityConfig>) -> Result<Self> {
        let rate_limiter =
            RateLimiter::new(security.rate_limit_calls, security.rate_limit_window)?;
        Ok(Self {
            security,
            rate_limiter,
        })
    }

    #[must_use]
    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Reads are never permission-gated, only rate limited
    pub fn check_read_operation(&self, operation: &str) -> Option<OperationBlocked> {
        self.rate_limit(operation, "read")
    }

    pub fn check_write_operation(&self, operation: &str) -> Option<OperationBlocked> {
        if self.security.read_only {
            debug!(operation = %operation, "Blocked by read-only mode");
            return Some(OperationBlocked::new(
                operation,
                READ_ONLY_REASON,
                ENV_READ_ONLY,
            ));
        }
        self.rate_limit(operation, "write")
    }

    /// Write gate, then the destructive switch, then two-factor confirmation
    ///
    /// The first failing check wins. Confirmation needs both `confirmed` and
    /// a `confirm_name` equal to `target`.
    pub fn check_destructive_operation(
        &self,
        operation: &str,
        target: &str,
        confirmed: bool,
        confirm_name: Option<&str>,
    ) -> Option<SafetyDenial> {
        if let Some(blocked) = self.check_write_operation(operation) {
            return Some(blocked.into());
        }

        if self.security.disable_destructive {
            debug!(operation = %operation, "Blocked by disabled destructive operations");
            return Some(
                OperationBlocked::new(operation, DESTRUCTIVE_DISABLED_REASON, ENV_DISABLE_DESTRUCTIVE)
                    .into(),
            );
        }

        if !confirmed || confirm_name != Some(target) {
            return Some(
                ConfirmationRequired::new(operation, target, impact_description(operation)).into(),
            );
        }

        None
    }

    /// Independent of the other checks; callers naming a cluster invoke it too
    pub fn check_cluster_operation(
        &self,
        operation: &str,
        cluster: &str,
    ) -> Option<OperationBlocked> {
        if self.security.single_cluster && cluster != IN_CLUSTER {
            return Some(OperationBlocked::new(
                operation,
                format!("Operation on cluster '{cluster}' blocked in single-cluster mode"),
                ENV_SINGLE_CLUSTER,
            ));
        }
        None
    }

    fn rate_limit(&self, operation: &str, mode: &str) -> Option<OperationBlocked> {
        let key = format!("{mode}:{operation}");
        if self.rate_limiter.check(&key) {
            None
        } else {
            Some(OperationBlocked::new(
                operation,
                RATE_LIMIT_REASON,
                ENV_RATE_LIMIT_CALLS,
            ))
        }
    }
}
