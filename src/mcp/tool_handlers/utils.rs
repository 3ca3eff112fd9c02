//! Utility functions for tool handlers

use serde_json::Value;

use crate::argocd::str_or;

/// `[OK]` for a good state, `[!]` otherwise
#[must_use]
pub const fn status_marker(ok: bool) -> &'static str {
    if ok { "[OK]" } else { "[!]" }
}

/// First `max` characters of `s`
///
/// Counts chars, not bytes, so multi-byte text is never split.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// `Kind/name` label for a resource or tree node
#[must_use]
pub fn resource_label(resource: &Value) -> String {
    format!(
        "{}/{}",
        str_or(&resource["kind"], "Unknown"),
        str_or(&resource["name"], "unknown")
    )
}
