//! Redis store implementation

use super::{ttl_seconds, KeyValueStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

/// Store backed by Redis
///
/// Uses plain keys with `SET EX` for cool-downs and hashes for counters and
/// diagnostics. The connection manager reconnects on its own; clones are
/// cheap and share the multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the Redis server at `redis_url`
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::store(format!("Failed to create Redis client: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::store(format!("Failed to connect to Redis: {e}")))?;

        debug!("Connected to Redis at: {}", redis_url);
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| Error::store(format!("Redis GET failed: {e}")))?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl_seconds(ttl))
            .await
            .map_err(|e| Error::store(format!("Redis SETEX failed: {e}")))?;
        Ok(())
    }

    async fn increment_field(&self, map: &str, field: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn
            .hincr(map, field, delta)
            .await
            .map_err(|e| Error::store(format!("Redis HINCRBY failed: {e}")))?;
        Ok(value)
    }

    async fn set_field(&self, map: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(map, field, value)
            .await
            .map_err(|e| Error::store(format!("Redis HSET failed: {e}")))?;
        Ok(())
    }

    async fn get_field(&self, map: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .hget(map, field)
            .await
            .map_err(|e| Error::store(format!("Redis HGET failed: {e}")))?;
        Ok(value)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}
