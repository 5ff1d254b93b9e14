use crate::error::Result;
use async_trait::async_trait;
use jiff::Timestamp;
use linkhop_cache::{LocalCacheStats, TierHealth};
use linkhop_core::LinkRecord;
use linkhop_ratelimit::Quota;
use std::sync::Arc;

/// Who is asking, as seen by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Rate-limit identity, typically the client IP.
    pub identity: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl ClientContext {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            user_agent: None,
            referer: None,
        }
    }
}

/// Parameters for registering a link.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLink {
    /// Absolute http(s) URL.
    pub target: String,
    /// Custom code instead of a generated one.
    pub alias: Option<String>,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: String,
    /// `None` when the limiter failed open.
    pub quota: Option<Quota>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub record: LinkRecord,
    pub quota: Option<Quota>,
}

/// Object-safe facade over link resolution and management.
///
/// Codes arrive as raw strings from the transport. Malformed codes are
/// reported as not found.
#[async_trait]
pub trait LinkResolver: Send + Sync + 'static {
    /// Resolves `code` for a redirect.
    async fn resolve(&self, code: &str, client: &ClientContext) -> Result<Resolution>;

    /// Registers a new link.
    async fn create(&self, request: CreateLink, client: &ClientContext) -> Result<Created>;

    /// Soft-deletes `code` and drops it from the caches.
    async fn deactivate(&self, code: &str) -> Result<()>;

    /// Replaces the expiry of `code` and drops it from the caches.
    async fn set_expiry(&self, code: &str, expires_at: Option<Timestamp>) -> Result<LinkRecord>;

    /// Reads the stored record for `code` straight from the store.
    ///
    /// Inactive and expired records are returned as they are.
    async fn lookup(&self, code: &str) -> Result<LinkRecord>;

    /// Drops `code` from the caches only.
    async fn invalidate(&self, code: &str);

    fn cache_stats(&self) -> LocalCacheStats;

    /// Reachability of the shared cache tier and the durable store.
    async fn health(&self) -> TierHealth;
}

#[async_trait]
impl<T: LinkResolver + ?Sized> LinkResolver for Arc<T> {
    async fn resolve(&self, code: &str, client: &ClientContext) -> Result<Resolution> {
        (**self).resolve(code, client).await
    }

    async fn create(&self, request: CreateLink, client: &ClientContext) -> Result<Created> {
        (**self).create(request, client).await
    }

    async fn deactivate(&self, code: &str) -> Result<()> {
        (**self).deactivate(code).await
    }

    async fn set_expiry(&self, code: &str, expires_at: Option<Timestamp>) -> Result<LinkRecord> {
        (**self).set_expiry(code, expires_at).await
    }

    async fn lookup(&self, code: &str) -> Result<LinkRecord> {
        (**self).lookup(code).await
    }

    async fn invalidate(&self, code: &str) {
        (**self).invalidate(code).await
    }

    fn cache_stats(&self) -> LocalCacheStats {
        (**self).cache_stats()
    }

    async fn health(&self) -> TierHealth {
        (**self).health().await
    }
}
