use crate::error::StorageError;
use crate::link::LinkRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;

/// Result type for durable store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of the durable store.
///
/// Reads return records as stored, including inactive and expired ones;
/// deciding resolvability is the caller's job.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Checks whether a short code is taken, whether or not it still resolves.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Checks that the backend is reachable. In-process stores always are.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// The authoritative link store.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record. Returns `Err(Conflict)` if the code already exists.
    async fn insert(&self, record: LinkRecord) -> Result<()>;

    /// Flips the `active` flag. Returns `false` if the code does not exist.
    async fn set_active(&self, code: &ShortCode, active: bool) -> Result<bool>;

    /// Replaces the expiry and returns the updated record, or `None` if the
    /// code does not exist.
    async fn set_expiry(
        &self,
        code: &ShortCode,
        expires_at: Option<Timestamp>,
    ) -> Result<Option<LinkRecord>>;
}

#[async_trait]
impl<R: ReadRepository + ?Sized> ReadRepository for Arc<R> {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        (**self).get(code).await
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        (**self).exists(code).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn insert(&self, record: LinkRecord) -> Result<()> {
        (**self).insert(record).await
    }

    async fn set_active(&self, code: &ShortCode, active: bool) -> Result<bool> {
        (**self).set_active(code, active).await
    }

    async fn set_expiry(
        &self,
        code: &ShortCode,
        expires_at: Option<Timestamp>,
    ) -> Result<Option<LinkRecord>> {
        (**self).set_expiry(code, expires_at).await
    }
}
