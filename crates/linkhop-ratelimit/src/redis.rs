use crate::error::{RateLimitError, Result};
use crate::store::{window_millis, WindowOutcome, WindowStore};
use async_trait::async_trait;
use redis::Script;
use std::time::Duration;
use tracing::trace;

/// Prune, count and conditionally insert in a single round trip.
///
/// KEYS[1] window key; ARGV now_ms, window_ms, limit, member.
/// Returns {admitted, count, oldest_ms or -1}.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local admitted = 0

if count < limit then
  redis.call('ZADD', key, now, ARGV[4])
  redis.call('PEXPIRE', key, window)
  count = count + 1
  admitted = 1
end

local oldest = -1
local head = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if head[2] then
  oldest = tonumber(head[2])
end

return {admitted, count, oldest}
"#;

fn map_redis_error(err: redis::RedisError) -> RateLimitError {
    let message = format!("sliding window script failed: {err}");
    if err.is_timeout() {
        RateLimitError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        RateLimitError::Unavailable(message)
    } else {
        RateLimitError::Operation(message)
    }
}

/// A [`WindowStore`] backed by Redis sorted sets.
///
/// Each window is a sorted set of members scored by admission time. The
/// whole prune-count-insert step runs as a Lua script, so it is atomic
/// across every instance sharing the server.
#[derive(Debug, Clone)]
pub struct RedisWindowStore {
    conn: redis::aio::MultiplexedConnection,
    script: Script,
}

impl RedisWindowStore {
    /// Creates a window store on top of a multiplexed Redis connection.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self {
            conn,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }
}

#[async_trait]
impl WindowStore for RedisWindowStore {
    async fn record(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        limit: u64,
        member: &str,
    ) -> Result<WindowOutcome> {
        trace!(key, now_ms, limit, "recording admission in Redis window");

        let mut conn = self.conn.clone();
        let (admitted, count, oldest): (i64, i64, i64) = self
            .script
            .key(key)
            .arg(now_ms)
            .arg(window_millis(window))
            .arg(limit)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        let count = u64::try_from(count)
            .map_err(|_| RateLimitError::InvalidData(format!("negative window size {count}")))?;

        Ok(WindowOutcome {
            admitted: admitted == 1,
            count,
            oldest_ms: (oldest >= 0).then_some(oldest),
        })
    }
}
