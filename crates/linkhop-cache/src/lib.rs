//! Cache tiers for the link resolution hot path.
//!
//! [`LocalCache`] is the per-instance strict LRU tier. [`RedisLinkCache`] and
//! [`MokaLinkCache`] implement the shared [`LinkCache`] tier. [`CacheHierarchy`]
//! composes them with the durable store into one read-through API.

pub mod hierarchy;
pub mod local;
pub mod moka;
pub mod redis;

pub use hierarchy::{CacheHierarchy, HierarchyConfig, TierHealth};
pub use linkhop_core::cache::{LinkCache, Result};
pub use linkhop_core::CacheError;
pub use local::{LocalCache, LocalCacheStats};
pub use moka::MokaLinkCache;
pub use redis::RedisLinkCache;
