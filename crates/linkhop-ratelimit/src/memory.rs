use crate::error::Result;
use crate::store::{window_millis, WindowOutcome, WindowStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct Window {
    /// Admission times in ascending order.
    tokens: VecDeque<i64>,
    window_ms: i64,
}

impl Window {
    fn prune(&mut self, now_ms: i64) {
        let cutoff = now_ms.saturating_sub(self.window_ms);
        while self.tokens.front().is_some_and(|&t| t <= cutoff) {
            self.tokens.pop_front();
        }
    }
}

/// An in-process [`WindowStore`] for single-instance deployments and tests.
///
/// The shard lock held by the map entry makes each `record` call atomic.
/// Windows left empty are only reclaimed by [`sweep`](Self::sweep).
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    windows: DashMap<String, Window>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every window with no live token at `now_ms`.
    ///
    /// Returns the number of windows removed.
    pub fn sweep(&self, now_ms: i64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now_ms);
            !window.tokens.is_empty()
        });
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "swept idle rate-limit windows");
        }
        removed
    }

    /// Number of tracked windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn record(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        limit: u64,
        _member: &str,
    ) -> Result<WindowOutcome> {
        let window_ms = window_millis(window);
        let mut entry = self.windows.entry(key.to_owned()).or_insert_with(|| Window {
            tokens: VecDeque::new(),
            window_ms,
        });
        let window = entry.value_mut();
        window.window_ms = window_ms;
        window.prune(now_ms);

        let count = window.tokens.len() as u64;
        let admitted = count < limit;
        if admitted {
            // keep the deque sorted even if clocks step backwards
            let at = window.tokens.partition_point(|&t| t <= now_ms);
            window.tokens.insert(at, now_ms);
        }

        Ok(WindowOutcome {
            admitted,
            count: window.tokens.len() as u64,
            oldest_ms: window.tokens.front().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn records_until_limit() {
        let store = MemoryWindowStore::new();

        for expected in 1..=3 {
            let outcome = store.record("k", 1_000, WINDOW, 3, "m").await.unwrap();
            assert!(outcome.admitted);
            assert_eq!(outcome.count, expected);
        }

        let outcome = store.record("k", 1_000, WINDOW, 3, "m").await.unwrap();
        assert!(!outcome.admitted);
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.oldest_ms, Some(1_000));
    }

    #[tokio::test]
    async fn tokens_expire_exactly_one_window_later() {
        let store = MemoryWindowStore::new();
        store.record("k", 0, WINDOW, 1, "m").await.unwrap();

        assert!(!store.record("k", 9_999, WINDOW, 1, "m").await.unwrap().admitted);
        assert!(store.record("k", 10_000, WINDOW, 1, "m").await.unwrap().admitted);
    }

    #[tokio::test]
    async fn out_of_order_timestamps_stay_sorted() {
        let store = MemoryWindowStore::new();
        store.record("k", 5_000, WINDOW, 10, "m").await.unwrap();
        let outcome = store.record("k", 4_000, WINDOW, 10, "m").await.unwrap();
        assert_eq!(outcome.oldest_ms, Some(4_000));
    }

    #[tokio::test]
    async fn sweep_drops_only_idle_windows() {
        let store = MemoryWindowStore::new();
        store.record("old", 0, WINDOW, 5, "m").await.unwrap();
        store.record("fresh", 8_000, WINDOW, 5, "m").await.unwrap();

        assert_eq!(store.sweep(12_000), 1);
        assert_eq!(store.len(), 1);

        assert_eq!(store.sweep(30_000), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn zero_limit_never_admits() {
        let store = MemoryWindowStore::new();
        let outcome = store.record("k", 0, WINDOW, 0, "m").await.unwrap();
        assert!(!outcome.admitted);
        assert_eq!(outcome.count, 0);
        assert_eq!(outcome.oldest_ms, None);
    }
}
