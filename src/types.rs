//! Common types used throughout reddit-gate
//!
//! Account identity, header names and the shared constants of the rate-limit
//! protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Metric tags, `key:value` formatted
pub type Tags = Vec<String>;

// ============================================================================
// Protocol Constants
// ============================================================================

/// Account id that disables all rate-limit bookkeeping for a call
pub const SKIP_RATE_LIMITING: &str = "<SKIP_RATE_LIMITING>";

/// Remaining quota at or below which an account is put into cool-down
pub const REQUEST_REMAINING_BUFFER: f64 = 50.0;

/// Used count above which an account is recorded as abnormal
pub const ABNORMAL_USED_THRESHOLD: i64 = 2000;

/// Byte length of the upstream's canonical empty listing body
pub const EMPTY_LISTING_BYTES: usize = 122;

/// Remaining quota response header
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Used quota response header
pub const RATE_LIMIT_USED_HEADER: &str = "x-ratelimit-used";

/// Seconds-until-reset response header
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

// ============================================================================
// Account Identity
// ============================================================================

/// Identifier of the end-user whose calls share one rate-limit budget
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an account id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved id used by internal calls that must not be throttled
    pub fn bypass() -> Self {
        Self(SKIP_RATE_LIMITING.to_string())
    }

    /// Whether this is the bypass sentinel
    pub fn is_bypass(&self) -> bool {
        self.0 == SKIP_RATE_LIMITING
    }

    /// Whether the id is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// HTTP GET
    #[default]
    GET,
    /// HTTP POST
    POST,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GET => f.write_str("GET"),
            Method::POST => f.write_str("POST"),
        }
    }
}
