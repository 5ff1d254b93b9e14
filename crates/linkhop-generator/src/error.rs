use linkhop_core::StorageError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    /// The uniqueness check against the store failed or timed out.
    #[error("storage error while checking code uniqueness: {0}")]
    Storage(#[from] StorageError),

    #[error("no free code found up to length {max_length}")]
    ExhaustedCapacity { max_length: usize },
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
