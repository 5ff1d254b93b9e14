use crate::Generator;
use linkhop_core::base62::{self, ALPHABET};
use linkhop_core::shortcode::MAX_LENGTH;
use linkhop_core::{Clock, ShortCode, SystemClock};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound (exclusive) of the random perturbation added to each candidate.
const PERTURBATION: u64 = 1_000_000;

/// Distance between consecutive candidates of one generator. Larger than
/// [`PERTURBATION`], so candidates never overlap before the modulo.
const SEQUENCE_STRIDE: u128 = 1_000_003;

/// Generates codes from the current millisecond timestamp plus a random
/// perturbation, reduced modulo `62^length`.
///
/// Codes spread over time instead of clustering on adjacent keys, and are
/// hard to enumerate by hand. This is not a cryptographic generator and must
/// never be used as a security boundary.
///
/// Each candidate also advances a per-generator sequence, so one generator
/// never repeats itself within `62^length / SEQUENCE_STRIDE` calls even when
/// the clock stands still.
#[derive(Debug)]
pub struct TimestampGenerator<C = SystemClock> {
    clock: C,
    sequence: AtomicU64,
}

impl TimestampGenerator<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TimestampGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TimestampGenerator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            sequence: AtomicU64::new(0),
        }
    }

    fn candidate_value(&self, length: usize, rng: &mut impl Rng) -> u128 {
        // pre-epoch clocks are treated as the epoch
        let millis = u128::try_from(self.clock.now().as_millisecond()).unwrap_or(0);
        let sequence = u128::from(self.sequence.fetch_add(1, Ordering::Relaxed));
        let noise = u128::from(rng.gen_range(0..PERTURBATION));

        let combined = millis
            .wrapping_add(sequence.wrapping_mul(SEQUENCE_STRIDE))
            .wrapping_add(noise);

        // past 21 symbols the space no longer fits in a u128 and every value fits
        match base62::space(length) {
            Some(space) => combined % space,
            None => combined,
        }
    }
}

impl<C: Clock> Generator for TimestampGenerator<C> {
    fn generate(&self, length: usize) -> ShortCode {
        let length = length.clamp(1, MAX_LENGTH);
        let mut rng = rand::thread_rng();

        let encoded = base62::encode(self.candidate_value(length, &mut rng));

        let mut code = String::with_capacity(length);
        for _ in encoded.len()..length {
            code.push(char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]));
        }
        code.push_str(&encoded);

        ShortCode::new_unchecked(code)
    }
}
