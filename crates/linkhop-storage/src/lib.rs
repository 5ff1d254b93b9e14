//! Durable store implementations for linkhop.
//!
//! The store is the ground truth for link records; cache tiers in front of it
//! are advisory.

pub mod memory;
pub mod mysql;

pub use linkhop_core::repository::{ReadRepository, Repository, Result};
pub use linkhop_core::StorageError;
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
