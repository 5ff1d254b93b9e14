//! Sliding-window admission control.
//!
//! Each `(identity, endpoint class)` pair owns a window of admission
//! timestamps in a [`WindowStore`]. The [`RateLimiter`] prunes, counts and
//! records in one atomic store call, and fails open when the store is
//! unreachable.

pub mod error;
pub mod limiter;
pub mod memory;
pub mod redis;
pub mod store;

pub use error::{RateLimitError, Result};
pub use limiter::{Admission, EndpointClass, Quota, RateLimitPolicy, RateLimiter};
pub use memory::MemoryWindowStore;
pub use redis::RedisWindowStore;
pub use store::{WindowOutcome, WindowStore};
