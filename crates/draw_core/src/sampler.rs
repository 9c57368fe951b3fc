use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    domain::{BallNumber, Draw, DrawBuilder},
    error::DrawError,
};

/// Upper bound on candidates drawn for one draw. Rejection sampling 6 of 45
/// needs only a handful in practice; the bound keeps a broken source from
/// spinning forever.
pub const MAX_SAMPLING_ATTEMPTS: usize = 10_000;

pub trait RandomSource: Send {
    /// Uniform integer in `low..=high`.
    fn next_in_range(&mut self, low: u8, high: u8) -> u8;
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn next_in_range(&mut self, low: u8, high: u8) -> u8 {
        self.0.gen_range(low..=high)
    }
}

pub fn sample_draw(random: &mut dyn RandomSource) -> Result<Draw, DrawError> {
    sample_draw_bounded(random, MAX_SAMPLING_ATTEMPTS)
}

/// Draws candidates in `BallNumber::MIN..=BallNumber::MAX`, keeping each one
/// not already chosen, until the draw is full.
pub fn sample_draw_bounded(
    random: &mut dyn RandomSource,
    max_attempts: usize,
) -> Result<Draw, DrawError> {
    let mut builder = DrawBuilder::default();
    for _ in 0..max_attempts {
        let candidate = BallNumber::new(random.next_in_range(BallNumber::MIN, BallNumber::MAX))?;
        builder.offer(candidate);
        if builder.is_complete() {
            return builder.finish();
        }
    }

    Err(DrawError::SamplingExhausted {
        attempts: max_attempts,
    })
}
