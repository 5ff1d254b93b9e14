use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// The authoritative record of a link, as held by the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Unique, immutable once assigned.
    pub code: ShortCode,
    /// Absolute URL the code redirects to.
    pub target: String,
    pub created_at: Timestamp,
    /// When the link stops resolving, if ever.
    pub expires_at: Option<Timestamp>,
    /// `false` once the link has been soft-deleted.
    pub active: bool,
}

impl LinkRecord {
    /// Creates an active record.
    pub fn new(
        code: ShortCode,
        target: impl Into<String>,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            code,
            target: target.into(),
            created_at,
            expires_at,
            active: true,
        }
    }

    /// A record resolves iff it is active and not past its expiry.
    pub fn is_resolvable(&self, now: Timestamp) -> bool {
        resolvable(self.active, self.expires_at, now)
    }

    /// The resolution-only projection stored in cache tiers.
    pub fn projection(&self) -> CacheEntry {
        CacheEntry {
            target: self.target.clone(),
            expires_at: self.expires_at,
            active: self.active,
        }
    }
}

/// A denormalized, resolution-only projection of a [`LinkRecord`].
///
/// Not authoritative; may be stale for as long as its tier keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub target: String,
    pub expires_at: Option<Timestamp>,
    pub active: bool,
}

impl CacheEntry {
    pub fn is_resolvable(&self, now: Timestamp) -> bool {
        resolvable(self.active, self.expires_at, now)
    }
}

fn resolvable(active: bool, expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    active && expires_at.is_none_or(|expires_at| now < expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn record(expires_at: Option<Timestamp>) -> LinkRecord {
        LinkRecord::new(
            ShortCode::new_unchecked("abc123"),
            "https://example.com",
            Timestamp::now(),
            expires_at,
        )
    }

    #[test]
    fn active_record_without_expiry_resolves() {
        assert!(record(None).is_resolvable(Timestamp::now()));
    }

    #[test]
    fn expired_record_does_not_resolve() {
        let now = Timestamp::now();
        let rec = record(Some(now - SignedDuration::from_secs(1)));
        assert!(!rec.is_resolvable(now));
    }

    #[test]
    fn record_expiring_exactly_now_does_not_resolve() {
        let now = Timestamp::now();
        assert!(!record(Some(now)).is_resolvable(now));
    }

    #[test]
    fn inactive_record_does_not_resolve() {
        let mut rec = record(None);
        rec.active = false;
        assert!(!rec.is_resolvable(Timestamp::now()));
        assert!(!rec.projection().is_resolvable(Timestamp::now()));
    }

    #[test]
    fn projection_carries_resolution_fields() {
        let expires = Timestamp::now() + SignedDuration::from_hours(1);
        let entry = record(Some(expires)).projection();
        assert_eq!(entry.target, "https://example.com");
        assert_eq!(entry.expires_at, Some(expires));
        assert!(entry.active);
    }
}
