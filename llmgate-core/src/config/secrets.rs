//! API key wrapper
//!
//! Keys are passed by reference into every attempt and must never reach a
//! log line. `Debug` and `Display` always print `[REDACTED]`; serde is
//! transparent so keys written to a config file read back unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key prefixes worth keeping in diagnostics, longest first
const KNOWN_PREFIXES: [&str; 5] = ["sk-emergent-", "sk-proj-", "sk-ant-", "sk-", "AIza"];

/// Number of trailing characters shown by `partial_redact`
const VISIBLE_SUFFIX: usize = 4;

/// A sensitive string such as a provider API key
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The raw key. Only adapters building auth headers should call this.
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// True for empty or whitespace-only keys
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Vendor prefix plus the last few characters, e.g. `sk-ant-...9xQz`.
    ///
    /// Enough to tell two keys apart in an error report without exposing
    /// either. Short or unrecognized keys are fully redacted.
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let prefix = KNOWN_PREFIXES
            .iter()
            .find(|prefix| self.value.starts_with(*prefix));
        match prefix {
            Some(prefix)
                if self.value.is_ascii() && self.value.len() >= prefix.len() + 2 * VISIBLE_SUFFIX =>
            {
                let suffix = &self.value[self.value.len() - VISIBLE_SUFFIX..];
                format!("{}...{}", prefix, suffix)
            }
            _ => "[REDACTED]".to_string(),
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
