use crate::error::{GeneratorError, Result};
use crate::Generator;
use linkhop_core::shortcode::MAX_LENGTH;
use linkhop_core::{ReadRepository, ShortCode, StorageError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Candidates tried at one length before the length grows.
pub const ATTEMPTS_PER_LENGTH: usize = 5;

/// How much the length grows after a run of collisions.
pub const LENGTH_GROWTH: usize = 2;

/// Wraps a [`Generator`] with the store-backed collision policy.
///
/// Each candidate is checked for existence in the store. After
/// [`ATTEMPTS_PER_LENGTH`] collisions in a row the length grows by
/// [`LENGTH_GROWTH`] and generation starts over. Without a configured
/// `max_length` growth only stops at the longest valid code, so pathological
/// collision rates trade latency for eventual success.
///
/// Every existence check runs under its own deadline when one is set with
/// [`with_check_timeout`](Self::with_check_timeout).
#[derive(Debug)]
pub struct UniqueCodeGenerator<G, R> {
    generator: G,
    store: R,
    max_length: Option<usize>,
    check_timeout: Option<Duration>,
}

impl<G, R> UniqueCodeGenerator<G, R>
where
    G: Generator,
    R: ReadRepository,
{
    pub fn new(generator: G, store: R) -> Self {
        Self {
            generator,
            store,
            max_length: None,
            check_timeout: None,
        }
    }

    /// Bounds each existence check; an overrun fails with
    /// [`StorageError::Timeout`].
    pub fn with_check_timeout(mut self, check_timeout: Duration) -> Self {
        self.check_timeout = Some(check_timeout);
        self
    }

    async fn is_taken(&self, candidate: &ShortCode) -> Result<bool> {
        let Some(limit) = self.check_timeout else {
            return Ok(self.store.exists(candidate).await?);
        };

        match timeout(limit, self.store.exists(candidate)).await {
            Ok(taken) => Ok(taken?),
            Err(_) => {
                warn!(code = %candidate, timeout = ?limit, "existence check timed out");
                Err(StorageError::Timeout(format!("existence check exceeded {limit:?}")).into())
            }
        }
    }

    /// Caps length growth; once exceeded, generation fails with
    /// [`GeneratorError::ExhaustedCapacity`].
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Produces a code of at least `length` symbols that the store does not hold.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::Storage`] if an existence check fails or times out
    /// - [`GeneratorError::ExhaustedCapacity`] if growth hits the cap
    pub async fn generate(&self, length: usize) -> Result<ShortCode> {
        let limit = self.max_length.unwrap_or(MAX_LENGTH).min(MAX_LENGTH);
        let mut length = length.clamp(1, MAX_LENGTH);

        loop {
            for attempt in 1..=ATTEMPTS_PER_LENGTH {
                let candidate = self.generator.generate(length);
                if !self.is_taken(&candidate).await? {
                    return Ok(candidate);
                }
                debug!(code = %candidate, attempt, length, "generated code is taken");
            }

            let next = length + LENGTH_GROWTH;
            if next > limit {
                warn!(length, max_length = limit, "code space exhausted");
                return Err(GeneratorError::ExhaustedCapacity { max_length: limit });
            }
            warn!(from = length, to = next, "every candidate collided, growing code length");
            length = next;
        }
    }
}
