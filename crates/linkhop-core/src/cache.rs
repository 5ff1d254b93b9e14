use crate::error::CacheError;
use crate::link::CacheEntry;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A shared, TTL-based cache of [`CacheEntry`] projections keyed by [`ShortCode`].
///
/// This is the distributed tier of the cache hierarchy. Implementations can
/// use Redis, an in-process cache for single-node deployments, or test doubles.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get an entry from the cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_entry(&self, code: &ShortCode) -> Result<Option<CacheEntry>>;

    /// Store an entry that expires after `ttl`.
    async fn set_entry(&self, code: &ShortCode, entry: &CacheEntry, ttl: Duration) -> Result<()>;

    /// Remove an entry from the cache.
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;

    /// Checks that the backend is reachable.
    ///
    /// In-process caches are always reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<C: LinkCache + ?Sized> LinkCache for Arc<C> {
    async fn get_entry(&self, code: &ShortCode) -> Result<Option<CacheEntry>> {
        (**self).get_entry(code).await
    }

    async fn set_entry(&self, code: &ShortCode, entry: &CacheEntry, ttl: Duration) -> Result<()> {
        (**self).set_entry(code, entry, ttl).await
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        (**self).del(code).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}
