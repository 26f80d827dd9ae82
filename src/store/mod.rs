//! Shared key-value store
//!
//! The rate-limit gate keeps all of its state here so that every process
//! instance sees the same cool-downs. Each operation is a single atomic call
//! against the backend; nothing is cached in-process.
//!
//! # Backends
//!
//! - **MemoryStore**: single-process, lazily expiring map (tests, local runs)
//! - **RedisStore**: Redis via an auto-reconnecting connection manager

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Cross-process key-value store with per-key expiry
///
/// A missing key is `Ok(None)`; every other failure is
/// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a plain key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a plain key that expires after `ttl` (second granularity)
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Add `delta` to a hash field, returning the new value
    async fn increment_field(&self, map: &str, field: &str, delta: i64) -> Result<i64>;

    /// Overwrite a hash field
    async fn set_field(&self, map: &str, field: &str, value: &str) -> Result<()>;

    /// Read a hash field
    async fn get_field(&self, map: &str, field: &str) -> Result<Option<String>>;
}

/// Round a TTL up to whole seconds, never below one
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}
