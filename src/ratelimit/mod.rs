//! Distributed rate-limit gate
//!
//! The upstream enforces a per-account quota and reports what is left on
//! every response. The gate turns that report into a cool-down record in the
//! shared store so that every process instance stops calling for that
//! account until the quota window resets.
//!
//! # Store Layout
//!
//! - `reddit:{account}:ratelimited`: cool-down record, JSON snapshot, expires
//!   after the reported reset
//! - `reddit:requests`: hash of request counts per account
//! - `reddit:ratelimited:crazy`: hash of the last snapshot per account whose
//!   used count looked abnormal

mod gate;

pub use gate::{cooldown_key, RateLimitGate, ABNORMAL_USAGE_KEY, REQUEST_COUNTS_KEY};
