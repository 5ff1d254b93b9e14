use crate::local::{LocalCache, LocalCacheStats};
use jiff::Timestamp;
use linkhop_core::cache::LinkCache;
use linkhop_core::repository::{ReadRepository, Result};
use linkhop_core::{CacheEntry, Clock, ShortCode, StorageError, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Tuning knobs for [`CacheHierarchy`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct HierarchyConfig {
    /// Maximum number of entries in the local tier.
    #[builder(default = 100)]
    pub local_capacity: usize,
    /// Upper bound on how long an entry lives in the cache tiers.
    #[builder(default = Duration::from_secs(3600))]
    pub link_ttl: Duration,
    /// Deadline for a single distributed-tier call.
    #[builder(default = Duration::from_millis(200))]
    pub distributed_timeout: Duration,
    /// Deadline for a single durable store read.
    #[builder(default = Duration::from_secs(2))]
    pub store_timeout: Duration,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Reachability of the shared tiers, as seen by one health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierHealth {
    pub distributed: bool,
    pub store: bool,
}

impl TierHealth {
    pub fn is_healthy(&self) -> bool {
        self.distributed && self.store
    }
}

/// Read-through composition of the local tier, the distributed tier and the
/// durable store.
///
/// # Lookup order
///
/// 1. Local tier. A hit returns immediately.
/// 2. Distributed tier. A hit is promoted into the local tier.
/// 3. Durable store. A resolvable record is promoted into both tiers.
///
/// Negative results are never cached. A cached entry that no longer resolves
/// is evicted from its tier and the lookup continues below it.
///
/// # Failure handling
///
/// Distributed-tier errors and timeouts are logged and treated as misses.
/// Promotion and invalidation are best-effort. Only a durable store failure
/// is surfaced to the caller, so an outage is never reported as "not found".
///
/// # Type Parameters
///
/// * `D` - The distributed tier (e.g., `RedisLinkCache`)
/// * `R` - The durable store
pub struct CacheHierarchy<D, R> {
    local: LocalCache,
    distributed: D,
    store: R,
    clock: Arc<dyn Clock>,
    config: HierarchyConfig,
}

impl<D, R> CacheHierarchy<D, R>
where
    D: LinkCache,
    R: ReadRepository,
{
    /// Creates a hierarchy over `distributed` and `store` using the system clock.
    pub fn new(distributed: D, store: R, config: HierarchyConfig) -> Self {
        Self::with_clock(distributed, store, config, Arc::new(SystemClock))
    }

    /// Creates a hierarchy whose expiry checks and local staleness follow `clock`.
    pub fn with_clock(
        distributed: D,
        store: R,
        config: HierarchyConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            local: LocalCache::with_clock(config.local_capacity, Arc::clone(&clock)),
            distributed,
            store,
            clock,
            config,
        }
    }

    /// Resolves `code` to its cache projection.
    ///
    /// Returns `Ok(None)` when the code is unknown, inactive or expired.
    ///
    /// # Errors
    ///
    /// Returns the store error when the durable store fails or times out
    /// after both cache tiers missed.
    pub async fn get(&self, code: &ShortCode) -> Result<Option<CacheEntry>> {
        let now = self.clock.now();

        trace!(code = %code, "probing local tier");
        if let Some(entry) = self.local.get(code) {
            debug!(code = %code, "local tier hit");
            return Ok(Some(entry));
        }

        trace!(code = %code, "probing distributed tier");
        match timeout(self.config.distributed_timeout, self.distributed.get_entry(code)).await {
            Ok(Ok(Some(entry))) if entry.is_resolvable(now) => {
                debug!(code = %code, "distributed tier hit, promoting to local tier");
                if let Some(ttl) = self.effective_ttl(&entry, self.config.link_ttl, now) {
                    self.local.put(code, entry.clone(), ttl);
                }
                return Ok(Some(entry));
            }
            Ok(Ok(Some(_))) => {
                debug!(code = %code, "distributed entry no longer resolves, evicting");
                self.delete_distributed(code).await;
            }
            Ok(Ok(None)) => trace!(code = %code, "distributed tier miss"),
            Ok(Err(e)) => {
                warn!(code = %code, error = %e, "distributed tier read failed, falling through");
            }
            Err(_) => {
                warn!(
                    code = %code,
                    timeout_ms = self.config.distributed_timeout.as_millis() as u64,
                    "distributed tier read timed out, falling through"
                );
            }
        }

        trace!(code = %code, "reading durable store");
        let record = match timeout(self.config.store_timeout, self.store.get(code)).await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                warn!(code = %code, error = %e, "durable store read failed");
                return Err(e);
            }
            Err(_) => {
                warn!(code = %code, "durable store read timed out");
                return Err(StorageError::Timeout(format!(
                    "store read for '{code}' exceeded {:?}",
                    self.config.store_timeout
                )));
            }
        };

        match record {
            Some(record) if record.is_resolvable(now) => {
                let entry = record.projection();
                debug!(code = %code, "durable store hit, promoting to cache tiers");
                self.put(code, &entry, self.config.link_ttl).await;
                Ok(Some(entry))
            }
            Some(_) => {
                debug!(code = %code, "record is inactive or expired");
                Ok(None)
            }
            None => {
                trace!(code = %code, "code not found");
                Ok(None)
            }
        }
    }

    /// Writes `entry` into both cache tiers.
    ///
    /// The effective TTL is `ttl` capped by the time left until the entry
    /// expires. An entry that already stopped resolving is not cached.
    /// Distributed-tier failures are logged, never returned.
    pub async fn put(&self, code: &ShortCode, entry: &CacheEntry, ttl: Duration) {
        let now = self.clock.now();
        if !entry.is_resolvable(now) {
            trace!(code = %code, "not caching an entry that does not resolve");
            return;
        }
        let Some(ttl) = self.effective_ttl(entry, ttl, now) else {
            return;
        };

        self.local.put(code, entry.clone(), ttl);

        match timeout(
            self.config.distributed_timeout,
            self.distributed.set_entry(code, entry, ttl),
        )
        .await
        {
            Ok(Ok(())) => trace!(code = %code, "stored entry in distributed tier"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "distributed tier write failed"),
            Err(_) => warn!(code = %code, "distributed tier write timed out"),
        }
    }

    /// Drops `code` from both cache tiers. The durable store is left untouched.
    pub async fn invalidate(&self, code: &ShortCode) {
        self.local.remove(code);
        self.delete_distributed(code).await;
        debug!(code = %code, "invalidated cached entry");
    }

    /// Counters for the local tier.
    pub fn local_stats(&self) -> LocalCacheStats {
        self.local.stats()
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    /// Pings the distributed tier and the durable store under their deadlines.
    pub async fn health(&self) -> TierHealth {
        let distributed = timeout(self.config.distributed_timeout, self.distributed.ping());
        let store = timeout(self.config.store_timeout, self.store.ping());
        let (distributed, store) = tokio::join!(distributed, store);

        let health = TierHealth {
            distributed: matches!(distributed, Ok(Ok(()))),
            store: matches!(store, Ok(Ok(()))),
        };
        if !health.is_healthy() {
            warn!(
                distributed = health.distributed,
                store = health.store,
                "health check found a tier down"
            );
        }
        health
    }

    async fn delete_distributed(&self, code: &ShortCode) {
        match timeout(self.config.distributed_timeout, self.distributed.del(code)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(code = %code, error = %e, "distributed tier delete failed"),
            Err(_) => warn!(code = %code, "distributed tier delete timed out"),
        }
    }

    fn effective_ttl(&self, entry: &CacheEntry, ttl: Duration, now: Timestamp) -> Option<Duration> {
        let Some(expires_at) = entry.expires_at else {
            return Some(ttl);
        };
        let remaining = now.duration_until(expires_at);
        if !remaining.is_positive() {
            return None;
        }
        Some(ttl.min(remaining.unsigned_abs()))
    }
}

impl<D, R> std::fmt::Debug for CacheHierarchy<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHierarchy")
            .field("local", &self.local)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
