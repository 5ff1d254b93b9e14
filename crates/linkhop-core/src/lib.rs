//! Core types and traits for the linkhop link resolver.
//!
//! This crate provides the shared vocabulary used by every other crate:
//! short codes, link records and their cache projection, the durable store
//! and distributed cache contracts, and an injectable clock.

pub mod base62;
pub mod cache;
pub mod clock;
pub mod error;
pub mod link;
pub mod repository;
pub mod shortcode;

pub use cache::LinkCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CoreError, StorageError};
pub use link::{CacheEntry, LinkRecord};
pub use repository::{ReadRepository, Repository};
pub use shortcode::ShortCode;
