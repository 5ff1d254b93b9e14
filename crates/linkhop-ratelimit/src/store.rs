use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Result of one atomic prune-count-record step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Whether a new token was recorded.
    pub admitted: bool,
    /// Live tokens after the step, including the new one if admitted.
    pub count: u64,
    /// Timestamp of the oldest live token, in unix milliseconds.
    pub oldest_ms: Option<i64>,
}

/// Storage for sliding windows of admission tokens.
///
/// [`record`](WindowStore::record) must be atomic per key: concurrent calls
/// for one key never admit more than `limit` tokens within a window.
#[async_trait]
pub trait WindowStore: Send + Sync + 'static {
    /// Drops tokens at or before `now_ms - window`, then records `member` at
    /// `now_ms` if fewer than `limit` tokens remain. An admitting call also
    /// pushes the key's expiry out to `window`.
    async fn record(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        limit: u64,
        member: &str,
    ) -> Result<WindowOutcome>;
}

#[async_trait]
impl<S: WindowStore + ?Sized> WindowStore for Arc<S> {
    async fn record(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        limit: u64,
        member: &str,
    ) -> Result<WindowOutcome> {
        (**self).record(key, now_ms, window, limit, member).await
    }
}

pub(crate) fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}
