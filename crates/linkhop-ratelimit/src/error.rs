use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    #[error("window store unavailable: {0}")]
    Unavailable(String),

    #[error("window store timeout: {0}")]
    Timeout(String),

    #[error("window store returned invalid data: {0}")]
    InvalidData(String),

    #[error("window store operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, RateLimitError>;
