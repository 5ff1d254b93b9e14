use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use linkhop_core::repository::{ReadRepository, Repository, Result};
use linkhop_core::{LinkRecord, ShortCode, StorageError};

/// In-memory implementation of the Repository trait using DashMap.
///
/// Records are never purged: soft-deleted and expired codes stay taken.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, LinkRecord>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored records, including inactive ones.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        Ok(self.storage.get(code.as_str()).map(|r| r.value().clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code.as_str()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, record: LinkRecord) -> Result<()> {
        // entry() holds the shard lock, so check-and-insert is atomic
        match self.storage.entry(record.code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.code.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn set_active(&self, code: &ShortCode, active: bool) -> Result<bool> {
        match self.storage.get_mut(code.as_str()) {
            Some(mut record) => {
                record.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_expiry(
        &self,
        code: &ShortCode,
        expires_at: Option<Timestamp>,
    ) -> Result<Option<LinkRecord>> {
        Ok(self.storage.get_mut(code.as_str()).map(|mut record| {
            record.expires_at = expires_at;
            record.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn record(c: &str, target: &str) -> LinkRecord {
        LinkRecord::new(code(c), target, Timestamp::now(), None)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryRepository::new();
        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        let got = repo.get(&code("abc123")).await.unwrap().unwrap();
        assert_eq!(got.target, "https://example.com");
        assert!(got.active);
        assert!(repo.exists(&code("abc123")).await.unwrap());
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.get(&code("nope")).await.unwrap().is_none());
        assert!(!repo.exists(&code("nope")).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let repo = InMemoryRepository::new();
        repo.insert(record("abc123", "https://one.example"))
            .await
            .unwrap();

        let err = repo
            .insert(record("abc123", "https://two.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let got = repo.get(&code("abc123")).await.unwrap().unwrap();
        assert_eq!(got.target, "https://one.example");
    }

    #[tokio::test]
    async fn codes_are_case_sensitive() {
        let repo = InMemoryRepository::new();
        repo.insert(record("abc", "https://lower.example"))
            .await
            .unwrap();
        repo.insert(record("ABC", "https://upper.example"))
            .await
            .unwrap();
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn soft_deleted_code_stays_taken() {
        let repo = InMemoryRepository::new();
        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        assert!(repo.set_active(&code("abc123"), false).await.unwrap());

        let got = repo.get(&code("abc123")).await.unwrap().unwrap();
        assert!(!got.active);
        assert!(repo.exists(&code("abc123")).await.unwrap());
        assert!(repo
            .insert(record("abc123", "https://other.example"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn set_active_on_missing_code() {
        let repo = InMemoryRepository::new();
        assert!(!repo.set_active(&code("nope"), false).await.unwrap());
    }

    #[tokio::test]
    async fn set_expiry_returns_updated_record() {
        let repo = InMemoryRepository::new();
        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        let past = Timestamp::now() - SignedDuration::from_secs(10);
        let updated = repo
            .set_expiry(&code("abc123"), Some(past))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.expires_at, Some(past));
        assert!(!updated.is_resolvable(Timestamp::now()));

        let cleared = repo
            .set_expiry(&code("abc123"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.expires_at, None);

        assert!(repo
            .set_expiry(&code("nope"), None)
            .await
            .unwrap()
            .is_none());
    }
}
