mod audit;
mod correlation;
mod guard;
mod rate_limiter;
mod sanitizer;
mod verdict;

pub use audit::{AuditEntry, AuditLogger, AuditOutcome};
pub use correlation::{
    correlation_id, generate_correlation_id, set_correlation_id, with_correlation_id,
};
pub use guard::{IN_CLUSTER, SafetyGuard, impact_description};
pub use rate_limiter::RateLimiter;
pub use sanitizer::{MASK, Sanitizer};
pub use verdict::{ConfirmationRequired, OperationBlocked, SafetyDenial};
