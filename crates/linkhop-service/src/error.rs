use linkhop_core::StorageError;
use linkhop_generator::GeneratorError;
use linkhop_ratelimit::Quota;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Malformed input. Never worth retrying.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("alias already taken: {0}")]
    AliasTaken(String),

    /// Unknown, inactive or expired.
    #[error("short link not found or expired: {0}")]
    NotFound(String),

    #[error("rate limit exceeded, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration, quota: Quota },

    #[error("no free code up to length {max_length}")]
    ExhaustedCapacity { max_length: usize },

    /// The durable store failed or timed out.
    #[error("infrastructure unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Unavailable(value.to_string())
    }
}

impl From<GeneratorError> for ServiceError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::Storage(e) => e.into(),
            GeneratorError::ExhaustedCapacity { max_length } => {
                Self::ExhaustedCapacity { max_length }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
