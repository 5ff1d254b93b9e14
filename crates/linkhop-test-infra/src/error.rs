use std::result::Result as StdResult;
use thiserror::Error;

/// Failures while standing up disposable containers for integration tests.
#[derive(Debug, Error)]
pub enum TestInfraError {
    /// The fixture was configured with values the container cannot use.
    #[error("invalid fixture config: {0}")]
    InvalidConfig(String),

    #[error("container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis client failed: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T> = StdResult<T, TestInfraError>;
