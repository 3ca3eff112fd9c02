//! Authorization outcomes
//!
//! A denial is a value, not an error. `SafetyGuard` returns
//! `Option<SafetyDenial>` so callers have to handle all three outcomes:
//! allowed (`None`), blocked, or waiting for confirmation.

use std::fmt;

use serde::Serialize;

use crate::config::ENV_RATE_LIMIT_CALLS;

/// A fail-closed decision caused by a configuration knob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationBlocked {
    pub operation: String,
    pub reason: String,
    /// Name of the setting that caused the block
    pub setting: String,
}

impl OperationBlocked {
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        reason: impl Into<String>,
        setting: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.into(),
            setting: setting.into(),
        }
    }

    /// What the operator has to change to lift the block
    #[must_use]
    pub fn unblock_hint(&self) -> String {
        if self.setting == ENV_RATE_LIMIT_CALLS {
            format!("Increase {ENV_RATE_LIMIT_CALLS} or wait for the rate limit window to pass")
        } else {
            format!("Set {}=false in server configuration", self.setting)
        }
    }

    #[must_use]
    pub fn format_message(&self) -> String {
        format!(
            "OPERATION BLOCKED: {}\nReason: {}\nSetting: {}\nTo enable: {}",
            self.operation,
            self.reason,
            self.setting,
            self.unblock_hint()
        )
    }
}

impl fmt::Display for OperationBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_message())
    }
}

/// A destructive operation paused until the caller echoes the target back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationRequired {
    pub operation: String,
    pub target: String,
    pub impact: String,
    pub confirmation_instructions: String,
    /// Extra context shown to the caller, in insertion order
    pub details: Vec<(String, String)>,
}

impl ConfirmationRequired {
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        target: impl Into<String>,
        impact: impl Into<String>,
    ) -> Self {
        let target = target.into();
        Self {
            operation: operation.into(),
            confirmation_instructions: format!(
                "To proceed, set confirm=true AND confirm_name='{target}'"
            ),
            target,
            impact: impact.into(),
            details: Vec::new(),
        }
    }

    /// Append a detail line; an existing key is overwritten in place
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_detail(key, value);
        self
    }

    pub fn set_detail(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.details.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.details.push((key, value)),
        }
    }

    #[must_use]
    pub fn format_message(&self) -> String {
        let mut lines = vec![
            format!("CONFIRMATION REQUIRED: {}", self.operation),
            String::new(),
            format!("Target: {}", self.target),
            format!("Impact: {}", self.impact),
        ];

        if !self.details.is_empty() {
            lines.push(String::new());
            lines.push("Details:".to_string());
            lines.extend(self.details.iter().map(|(k, v)| format!("  {k}: {v}")));
        }

        lines.push(String::new());
        lines.push(self.confirmation_instructions.clone());
        lines.join("\n")
    }
}

impl fmt::Display for ConfirmationRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_message())
    }
}

/// Why a destructive operation may not proceed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyDenial {
    Blocked(OperationBlocked),
    ConfirmationRequired(ConfirmationRequired),
}

impl SafetyDenial {
    #[must_use]
    pub fn format_message(&self) -> String {
        match self {
            Self::Blocked(b) => b.format_message(),
            Self::ConfirmationRequired(c) => c.format_message(),
        }
    }

    /// Short reason recorded in the audit trail
    #[must_use]
    pub fn audit_reason(&self) -> &str {
        match self {
            Self::Blocked(b) => &b.reason,
            Self::ConfirmationRequired(_) => "confirmation required",
        }
    }
}

impl From<OperationBlocked> for SafetyDenial {
    fn from(blocked: OperationBlocked) -> Self {
        Self::Blocked(blocked)
    }
}

impl From<ConfirmationRequired> for SafetyDenial {
    fn from(confirmation: ConfirmationRequired) -> Self {
        Self::ConfirmationRequired(confirmation)
    }
}

impl fmt::Display for SafetyDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_message())
    }
}
