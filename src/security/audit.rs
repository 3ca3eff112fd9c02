//! Audit trail of authorization decisions and tool outcomes
//!
//! Entries go to a JSON-lines file when one is configured, otherwise to
//! `tracing` events under the `audit` target.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::info;

use super::correlation::correlation_id;
use crate::error::{Result, ServerError};

/// Outcome recorded for an audited action
///
/// Write handlers pass free-form results such as `dry_run` or `initiated`
/// through [`AuditOutcome::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Blocked,
    Error,
    Other(String),
}

impl AuditOutcome {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Blocked => "blocked",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for AuditOutcome {
    fn from(value: &str) -> Self {
        match value {
            "success" => Self::Success,
            "blocked" => Self::Blocked,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuditOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One line of the audit trail
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub correlation_id: String,
    pub action: String,
    pub target: String,
    pub result: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl AuditEntry {
    /// Build an entry stamped with the current time and correlation id
    #[must_use]
    pub fn new(
        action: &str,
        target: &str,
        result: AuditOutcome,
        details: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            correlation_id: correlation_id(),
            action: action.to_string(),
            target: target.to_string(),
            result,
            details: details.filter(|d| !d.is_empty()),
        }
    }
}

/// Append-only recorder of authorization decisions and outcomes
///
/// With a path, every entry is one JSON line appended to the file.
/// Without one, entries become `tracing` events with target `audit`.
pub struct AuditLogger {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl AuditLogger {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Logger that only emits tracing events
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record one entry
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::AuditWrite`] if the audit file cannot be
    /// opened or written.
    pub fn log(
        &self,
        action: &str,
        target: &str,
        result: impl Into<AuditOutcome>,
        details: Option<Map<String, Value>>,
    ) -> Result<()> {
        let entry = AuditEntry::new(action, target, result.into(), details);
        match &self.path {
            Some(path) => self.append(path, &entry),
            None => {
                Self::log_to_tracing(&entry);
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// See [`log`](Self::log).
    pub fn log_read(&self, action: &str, target: &str) -> Result<()> {
        self.log(action, target, AuditOutcome::Success, None)
    }

    /// # Errors
    ///
    /// See [`log`](Self::log).
    pub fn log_write(
        &self,
        action: &str,
        target: &str,
        result: &str,
        details: Option<Map<String, Value>>,
    ) -> Result<()> {
        self.log(action, target, result, details)
    }

    /// # Errors
    ///
    /// See [`log`](Self::log).
    pub fn log_blocked(&self, action: &str, target: &str, reason: &str) -> Result<()> {
        self.log(
            action,
            target,
            AuditOutcome::Blocked,
            Some(single_detail("reason", reason)),
        )
    }

    /// # Errors
    ///
    /// See [`log`](Self::log).
    pub fn log_error(&self, action: &str, target: &str, error: &str) -> Result<()> {
        self.log(
            action,
            target,
            AuditOutcome::Error,
            Some(single_detail("error", error)),
        )
    }

    fn append(&self, path: &Path, entry: &AuditEntry) -> Result<()> {
        let audit_err = |e: std::io::Error| ServerError::AuditWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(audit_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(audit_err)?;
        file.write_all(line.as_bytes()).map_err(audit_err)?;
        Ok(())
    }

    fn log_to_tracing(entry: &AuditEntry) {
        match &entry.details {
            Some(details) => {
                let details = Value::Object(details.clone());
                info!(
                    target: "audit",
                    timestamp = %entry.timestamp,
                    correlation_id = %entry.correlation_id,
                    action = %entry.action,
                    target = %entry.target,
                    result = %entry.result,
                    details = %details,
                    "audit"
                );
            }
            None => info!(
                target: "audit",
                timestamp = %entry.timestamp,
                correlation_id = %entry.correlation_id,
                action = %entry.action,
                target = %entry.target,
                result = %entry.result,
                "audit"
            ),
        }
    }
}

fn single_detail(key: &str, value: &str) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert(key.to_string(), Value::String(value.to_string()));
    details
}
