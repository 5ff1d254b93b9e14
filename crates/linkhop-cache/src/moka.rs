use async_trait::async_trait;
use linkhop_core::cache::{LinkCache, Result};
use linkhop_core::{CacheEntry, ShortCode};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct Stored {
    entry: CacheEntry,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-process [`LinkCache`] backed by Moka.
///
/// Stands in for the shared tier in single-node deployments and tests. It is
/// not shared between instances.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<String, Stored>,
}

impl MokaLinkCache {
    /// Creates a cache with a default maximum capacity of 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a cache with a custom maximum capacity.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries the cache can hold
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get_entry(&self, code: &ShortCode) -> Result<Option<CacheEntry>> {
        trace!(code = %code, "Fetching link entry from Moka cache");

        match self.cache.get(code.as_str()).await {
            Some(stored) => {
                debug!(code = %code, "Cache hit in Moka");
                Ok(Some(stored.entry))
            }
            None => {
                trace!(code = %code, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set_entry(&self, code: &ShortCode, entry: &CacheEntry, ttl: Duration) -> Result<()> {
        trace!(code = %code, ttl_ms = ttl.as_millis() as u64, "Storing link entry in Moka cache");

        let stored = Stored {
            entry: entry.clone(),
            ttl,
        };
        self.cache.insert(code.as_str().to_owned(), stored).await;
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        trace!(code = %code, "Removing link entry from Moka cache");

        self.cache.invalidate(code.as_str()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn set_get_del() {
        let cache = MokaLinkCache::new();
        let c = code("abc123");

        assert!(cache.get_entry(&c).await.unwrap().is_none());

        cache
            .set_entry(&c, &entry("https://example.com"), Duration::from_secs(60))
            .await
            .unwrap();
        let got = cache.get_entry(&c).await.unwrap().unwrap();
        assert_eq!(got.target, "https://example.com");

        cache.del(&c).await.unwrap();
        assert!(cache.get_entry(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn del_missing_is_ok() {
        let cache = MokaLinkCache::new();
        assert!(cache.del(&code("missing")).await.is_ok());
    }

    #[tokio::test]
    async fn entries_expire_after_their_own_ttl() {
        let cache = MokaLinkCache::new();
        let short = entry("https://short.example");
        let long = entry("https://long.example");
        cache
            .set_entry(&code("short"), &short, Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set_entry(&code("long"), &long, Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get_entry(&code("short")).await.unwrap().is_none());
        assert!(cache.get_entry(&code("long")).await.unwrap().is_some());
    }
}
