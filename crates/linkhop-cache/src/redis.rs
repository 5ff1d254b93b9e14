use async_trait::async_trait;
use linkhop_core::cache::{LinkCache, Result};
use linkhop_core::{CacheEntry, CacheError, ShortCode};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default namespace for link entries. Rate-limit windows live under a
/// different prefix.
pub const DEFAULT_KEY_PREFIX: &str = "lh:link:";

/// A Redis-based implementation of [`LinkCache`].
///
/// Entries are stored as JSON strings under a configurable key prefix, each
/// with its own expiry.
#[derive(Debug, Clone)]
pub struct RedisLinkCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisLinkCache {
    /// Creates a new Redis link cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis link cache with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Custom prefix for cache keys (e.g., "myapp:link:")
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    fn cache_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get_entry(&self, code: &ShortCode) -> Result<Option<CacheEntry>> {
        let key = self.cache_key(code);
        trace!(code = %code, "Fetching link entry from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(cached)) => {
                debug!(code = %code, "Cache hit in Redis");
                match serde_json::from_str::<CacheEntry>(&cached) {
                    Ok(entry) => Ok(Some(entry)),
                    Err(e) => {
                        warn!(code = %code, error = %e, "Failed to deserialize cached entry");
                        Err(CacheError::InvalidData(format!(
                            "invalid cached value for key '{key}': {e}"
                        )))
                    }
                }
            }
            Ok(None) => {
                trace!(code = %code, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => Err(map_redis_error("failed to fetch value from Redis", e)),
        }
    }

    async fn set_entry(&self, code: &ShortCode, entry: &CacheEntry, ttl: Duration) -> Result<()> {
        let key = self.cache_key(code);
        trace!(code = %code, "Storing link entry in Redis cache");

        let json = serde_json::to_string(entry).map_err(|e| {
            CacheError::Serialization(format!("failed to serialize cache value: {e}"))
        })?;
        // PSETEX rejects a zero expiry
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(&key, json, ttl_ms)
            .await
            .map_err(|e| map_redis_error("failed to write value to Redis", e))?;
        debug!(code = %code, ttl_ms, "Cached entry in Redis");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let key = self.cache_key(code);
        trace!(code = %code, "Removing link entry from Redis cache");

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| map_redis_error("failed to delete value from Redis", e))?;
        debug!(code = %code, "Removed entry from Redis cache");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to ping Redis", e))?;
        Ok(())
    }
}
