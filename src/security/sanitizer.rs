use std::borrow::Cow;

use regex::{Regex, RegexSet};
use serde_json::Value;
use tracing::{debug, error};

/// Replacement for masked values
pub const MASK: &str = "***MASKED***";

/// Object keys whose values are always masked (compared lowercase)
const SENSITIVE_KEYS: &[&str] = &[
    "token",
    "password",
    "secret",
    "api_key",
    "apikey",
    "api-key",
    "authorization",
    "auth",
    "credential",
    "credentials",
    "key",
];

/// Patterns applied to string values; group 1 is kept
const SECRET_PATTERNS: &[&str] = &[
    r#"(?i)(token["']?\s*[:=]\s*["']?)[^"'\s,}]+"#,
    r#"(?i)(password["']?\s*[:=]\s*["']?)[^"'\s,}]+"#,
    r#"(?i)(secret["']?\s*[:=]\s*["']?)[^"'\s,}]+"#,
    r#"(?i)(api[_-]?key["']?\s*[:=]\s*["']?)[^"'\s,}]+"#,
    r#"(?i)(bearer\s+)[^\s"']+"#,
];

/// Masks secrets in ArgoCD API responses
///
/// Sensitive keys are replaced wholesale; every other string value is
/// scrubbed with [`SECRET_PATTERNS`]. A disabled sanitizer is a pass-through.
pub struct Sanitizer {
    patterns: Vec<Regex>,
    /// Single-pass check whether any pattern matches
    detection_set: RegexSet,
    enabled: bool,
}

impl Sanitizer {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let patterns: Vec<Regex> = SECRET_PATTERNS
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    error!(pattern = %p, error = %e, "Invalid secret pattern");
                    None
                }
            })
            .collect();

        let detection_set = RegexSet::new(patterns.iter().map(Regex::as_str))
            .unwrap_or_else(|_| RegexSet::empty());

        Self {
            patterns,
            detection_set,
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            patterns: Vec::new(),
            detection_set: RegexSet::empty(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Scrub secrets out of free text, borrowing when nothing matches
    #[must_use]
    pub fn sanitize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.enabled {
            return Cow::Borrowed(text);
        }

        let matched: Vec<usize> = self.detection_set.matches(text).into_iter().collect();
        if matched.is_empty() {
            return Cow::Borrowed(text);
        }

        debug!(len = text.len(), patterns = matched.len(), "Masking secrets in text");
        let mut result = text.to_string();
        for idx in matched {
            if let Some(regex) = self.patterns.get(idx) {
                result = regex
                    .replace_all(&result, format!("${{1}}{MASK}").as_str())
                    .into_owned();
            }
        }
        Cow::Owned(result)
    }

    /// Mask a JSON document recursively
    #[must_use]
    pub fn mask_value(&self, value: Value) -> Value {
        if !self.enabled {
            return value;
        }

        match value {
            Value::String(s) => {
                let masked = match self.sanitize(&s) {
                    Cow::Owned(masked) => Some(masked),
                    Cow::Borrowed(_) => None,
                };
                Value::String(masked.unwrap_or(s))
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        if is_sensitive_key(&k) {
                            (k, Value::String(MASK.to_string()))
                        } else {
                            let masked = self.mask_value(v);
                            (k, masked)
                        }
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.mask_value(v)).collect())
            }
            other => other,
        }
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lower.as_str())
}
