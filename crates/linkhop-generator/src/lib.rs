pub mod error;
pub mod timestamp;
pub mod unique;

pub use error::{GeneratorError, Result};
pub use timestamp::TimestampGenerator;
pub use unique::UniqueCodeGenerator;

use linkhop_core::ShortCode;
use std::sync::Arc;

/// Trait for producing candidate short codes.
///
/// Implementations are pure generators that don't interact with storage;
/// uniqueness against the store is enforced by [`UniqueCodeGenerator`].
pub trait Generator: Send + Sync + 'static {
    /// Produces a candidate of at least `length` base-62 symbols.
    fn generate(&self, length: usize) -> ShortCode;
}

impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn generate(&self, length: usize) -> ShortCode {
        (**self).generate(length)
    }
}
