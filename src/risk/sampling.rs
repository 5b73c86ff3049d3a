//! Standard-normal sampling behind an injectable source.
//!
//! The Monte Carlo loop never touches an RNG directly; it pulls deviates from
//! a [`NormalSource`] so tests can substitute a fixed sequence and assert
//! exact percentile outputs.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A source of independent standard-normal deviates.
pub trait NormalSource {
    /// Returns the next N(0, 1) sample.
    fn sample(&mut self) -> f64;
}

/// Box–Muller transform over any uniform RNG.
///
/// Each pass through the transform yields two deviates; the second is cached
/// and handed out on the next call.
#[derive(Debug, Clone)]
pub struct BoxMuller<R: Rng> {
    rng: R,
    spare: Option<f64>,
}

impl<R: Rng> BoxMuller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, spare: None }
    }
}

impl BoxMuller<StdRng> {
    /// Convenience constructor from a master seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NormalSource for BoxMuller<R> {
    fn sample(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // u1 in (0, 1] so the log is finite.
        let u1: f64 = 1.0 - self.rng.random::<f64>();
        let u2: f64 = self.rng.random();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        self.spare = Some(radius * theta.sin());
        radius * theta.cos()
    }
}

/// Fixed deviate sequence for tests; cycles when exhausted.
#[derive(Debug, Clone)]
pub struct FixedSource {
    values: Vec<f64>,
    next: usize,
}

impl FixedSource {
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "FixedSource needs at least one value");
        Self { values, next: 0 }
    }
}

impl NormalSource for FixedSource {
    fn sample(&mut self) -> f64 {
        let z = self.values[self.next % self.values.len()];
        self.next += 1;
        z
    }
}
