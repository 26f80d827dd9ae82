//! In-process store implementation

use super::{ttl_seconds, KeyValueStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    keys: HashMap<String, Entry>,
    maps: HashMap<String, HashMap<String, String>>,
}

/// Store backed by a process-local map
///
/// Expiry is checked on read, against the tokio clock, so tests can move
/// time with `tokio::time::pause`/`advance`. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Result<T> {
        match self.inner.lock() {
            Ok(mut inner) => Ok(f(&mut inner)),
            Err(e) => Err(Error::store(format!("Lock error: {e}"))),
        }
    }

    /// Number of live plain keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.with_inner(|inner| inner.keys.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    /// Whether the store holds no live plain keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        self.with_inner(|inner| match inner.keys.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                inner.keys.remove(key);
                debug!("Expired key removed: {}", key);
                None
            }
            None => None,
        })
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let secs = ttl_seconds(ttl);
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(secs))
            .ok_or_else(|| Error::store(format!("TTL of {secs}s for {key} is out of range")))?;
        self.with_inner(|inner| {
            inner.keys.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at,
                },
            );
        })
    }

    async fn increment_field(&self, map: &str, field: &str, delta: i64) -> Result<i64> {
        self.with_inner(|inner| -> Result<i64> {
            let slot = inner
                .maps
                .entry(map.to_string())
                .or_default()
                .entry(field.to_string())
                .or_insert_with(|| "0".to_string());
            let current: i64 = slot.parse().map_err(|_| {
                Error::store(format!("Field {map}.{field} is not an integer"))
            })?;
            let next = current + delta;
            *slot = next.to_string();
            Ok(next)
        })?
    }

    async fn set_field(&self, map: &str, field: &str, value: &str) -> Result<()> {
        self.with_inner(|inner| {
            inner
                .maps
                .entry(map.to_string())
                .or_default()
                .insert(field.to_string(), value.to_string());
        })
    }

    async fn get_field(&self, map: &str, field: &str) -> Result<Option<String>> {
        self.with_inner(|inner| inner.maps.get(map).and_then(|m| m.get(field)).cloned())
    }
}
