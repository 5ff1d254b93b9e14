use jiff::{SignedDuration, Timestamp};
use linkhop_core::{CacheEntry, Clock, ShortCode, SystemClock};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

struct Slot {
    entry: CacheEntry,
    stale_at: Timestamp,
}

/// A bounded, strict least-recently-used cache owned by a single instance.
///
/// Both [`get`](Self::get) and [`put`](Self::put) count toward recency. Once
/// the cache holds `capacity` entries, inserting a new key evicts the least
/// recently used one. Every entry also carries a staleness deadline so that a
/// hot key is eventually re-read from the shared tier.
///
/// All state sits behind one mutex; hit and miss counters are lock-free.
pub struct LocalCache {
    entries: Mutex<LruCache<String, Slot>>,
    capacity: NonZeroUsize,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Read-only counters for the local tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or `0.0` before the first lookup.
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
}

impl LocalCache {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Creates a cache whose staleness deadlines follow `clock`.
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up `code` and marks it most recently used.
    ///
    /// An entry that went stale, expired or was deactivated is dropped and
    /// reported as a miss.
    pub fn get(&self, code: &ShortCode) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let lookup = entries.get(code.as_str()).map(|slot| {
            (now < slot.stale_at && slot.entry.is_resolvable(now)).then(|| slot.entry.clone())
        });

        let found = match lookup {
            Some(Some(entry)) => Some(entry),
            Some(None) => {
                trace!(code = %code, "local entry no longer resolves");
                entries.pop(code.as_str());
                None
            }
            None => None,
        };
        drop(entries);

        match found {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts or replaces `code`, keeping it for at most `ttl`.
    ///
    /// Returns the code that was evicted to make room, if any.
    pub fn put(&self, code: &ShortCode, entry: CacheEntry, ttl: Duration) -> Option<String> {
        let now = self.clock.now();
        let stale_at = SignedDuration::try_from(ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl).ok())
            .unwrap_or(Timestamp::MAX);

        let mut entries = self.entries.lock();
        let evicted = entries
            .push(code.as_str().to_owned(), Slot { entry, stale_at })
            .and_then(|(key, _)| (key != code.as_str()).then_some(key));
        drop(entries);

        if let Some(key) = &evicted {
            trace!(code = %code, evicted = %key, "local cache at capacity, evicted least recently used");
        }
        evicted
    }

    /// Removes `code`. Returns whether it was present.
    pub fn remove(&self, code: &ShortCode) -> bool {
        self.entries.lock().pop(code.as_str()).is_some()
    }

    /// Returns whether `code` is cached, without touching recency or counters.
    pub fn contains(&self, code: &ShortCode) -> bool {
        self.entries.lock().contains(code.as_str())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn stats(&self) -> LocalCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        LocalCacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
            capacity: self.capacity(),
        }
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkhop_core::ManualClock;

    const TTL: Duration = Duration::from_secs(3600);

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn entry(target: &str) -> CacheEntry {
        CacheEntry {
            target: target.to_string(),
            expires_at: None,
            active: true,
        }
    }

    #[test]
    fn get_returns_what_was_put() {
        let cache = LocalCache::new(4);
        cache.put(&code("abc"), entry("https://example.com"), TTL);

        let got = cache.get(&code("abc")).unwrap();
        assert_eq!(got.target, "https://example.com");
        assert!(cache.get(&code("nope")).is_none());
    }

    #[test]
    fn never_exceeds_capacity() {
        let cache = LocalCache::new(3);
        for i in 0..10 {
            cache.put(&code(&format!("c{i}")), entry("https://example.com"), TTL);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn evicts_least_recently_inserted_when_untouched() {
        let cache = LocalCache::new(2);
        cache.put(&code("a"), entry("https://a.example"), TTL);
        cache.put(&code("b"), entry("https://b.example"), TTL);

        let evicted = cache.put(&code("c"), entry("https://c.example"), TTL);
        assert_eq!(evicted.as_deref(), Some("a"));
        assert!(!cache.contains(&code("a")));
        assert!(cache.contains(&code("b")));
        assert!(cache.contains(&code("c")));
    }

    #[test]
    fn get_refreshes_recency() {
        let cache = LocalCache::new(2);
        cache.put(&code("a"), entry("https://a.example"), TTL);
        cache.put(&code("b"), entry("https://b.example"), TTL);

        // touching "a" makes "b" the eviction candidate
        assert!(cache.get(&code("a")).is_some());
        cache.put(&code("c"), entry("https://c.example"), TTL);

        assert!(cache.contains(&code("a")));
        assert!(!cache.contains(&code("b")));
    }

    #[test]
    fn put_on_existing_key_refreshes_recency_without_evicting() {
        let cache = LocalCache::new(2);
        cache.put(&code("a"), entry("https://a.example"), TTL);
        cache.put(&code("b"), entry("https://b.example"), TTL);

        assert!(cache
            .put(&code("a"), entry("https://a2.example"), TTL)
            .is_none());
        cache.put(&code("c"), entry("https://c.example"), TTL);

        assert_eq!(cache.get(&code("a")).unwrap().target, "https://a2.example");
        assert!(!cache.contains(&code("b")));
    }

    #[test]
    fn stale_entries_are_dropped() {
        let clock = ManualClock::new(Timestamp::from_second(1_000).unwrap());
        let cache = LocalCache::with_clock(4, Arc::new(clock.clone()));
        cache.put(&code("a"), entry("https://a.example"), Duration::from_secs(10));

        clock.advance(Duration::from_secs(9));
        assert!(cache.get(&code("a")).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&code("a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_or_inactive_entries_are_misses() {
        let clock = ManualClock::new(Timestamp::from_second(1_000).unwrap());
        let cache = LocalCache::with_clock(4, Arc::new(clock.clone()));
        let expiring = CacheEntry {
            expires_at: Some(Timestamp::from_second(1_005).unwrap()),
            ..entry("https://a.example")
        };
        let inactive = CacheEntry {
            active: false,
            ..entry("https://b.example")
        };
        cache.put(&code("a"), expiring, TTL);
        cache.put(&code("b"), inactive, TTL);

        assert!(cache.get(&code("b")).is_none());
        clock.advance(Duration::from_secs(5));
        assert!(cache.get(&code("a")).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_and_gets_stay_within_capacity() {
        let cache = Arc::new(LocalCache::new(16));
        let mut tasks = tokio::task::JoinSet::new();

        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move {
                for i in 0..500 {
                    let key = code(&format!("w{worker}k{}", i % 40));
                    cache.put(&key, entry("https://example.com"), TTL);
                    cache.get(&key);
                    assert!(cache.len() <= 16);
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        assert_eq!(cache.len(), 16);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8 * 500);
    }

    #[test]
    fn remove_and_clear() {
        let cache = LocalCache::new(4);
        cache.put(&code("a"), entry("https://a.example"), TTL);
        cache.put(&code("b"), entry("https://b.example"), TTL);

        assert!(cache.remove(&code("a")));
        assert!(!cache.remove(&code("a")));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_holds_one_entry() {
        let cache = LocalCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(&code("a"), entry("https://a.example"), TTL);
        cache.put(&code("b"), entry("https://b.example"), TTL);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&code("b")));
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = LocalCache::new(4);
        assert_eq!(cache.stats().hit_rate, 0.0);

        cache.put(&code("a"), entry("https://a.example"), TTL);
        cache.get(&code("a"));
        cache.get(&code("a"));
        cache.get(&code("a"));
        cache.get(&code("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.75);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 4);
    }

    #[test]
    fn contains_does_not_count_as_lookup() {
        let cache = LocalCache::new(4);
        cache.put(&code("a"), entry("https://a.example"), TTL);
        assert!(cache.contains(&code("a")));

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }
}
