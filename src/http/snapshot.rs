//! Rate-limit header snapshot

use crate::types::{RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER, RATE_LIMIT_USED_HEADER};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quota state reported by the server on one response
///
/// When `present` is false the server sent no rate-limit headers and the
/// other fields carry no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    /// Remaining quota in server-defined units
    pub remaining: f64,
    /// Requests used in the current window
    pub used: i64,
    /// Seconds until the window resets
    pub reset: i64,
    /// Whether the rate-limit headers were sent
    pub present: bool,
    /// When the response was received
    pub observed_at: DateTime<Utc>,
}

impl RateLimitSnapshot {
    /// Snapshot for a response without rate-limit headers
    pub fn absent() -> Self {
        Self {
            remaining: 0.0,
            used: 0,
            reset: 0,
            present: false,
            observed_at: Utc::now(),
        }
    }

    /// Snapshot with the given quota values, observed now
    pub fn new(remaining: f64, used: i64, reset: i64) -> Self {
        Self {
            remaining,
            used,
            reset,
            present: true,
            observed_at: Utc::now(),
        }
    }

    /// Parse the `x-ratelimit-*` headers.
    ///
    /// A non-empty remaining header marks the snapshot present; unparseable
    /// numbers read as zero.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let remaining = header_str(headers, RATE_LIMIT_REMAINING_HEADER);
        if remaining.is_empty() {
            return Self::absent();
        }

        Self::new(
            remaining.trim().parse().unwrap_or(0.0),
            header_str(headers, RATE_LIMIT_USED_HEADER)
                .trim()
                .parse()
                .unwrap_or(0),
            header_str(headers, RATE_LIMIT_RESET_HEADER)
                .trim()
                .parse()
                .unwrap_or(0),
        )
    }

    /// Time until the quota window resets, `None` if not positive
    pub fn reset_after(&self) -> Option<Duration> {
        u64::try_from(self.reset)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
