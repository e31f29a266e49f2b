//! Value sources consumed by the constructors
//!
//! Random construction only needs "give me the next value", and tabular import
//! only needs "give me the value at (row, col)". Both are expressed as small
//! traits so any distribution or data-frame type can plug in.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Stream of values for random construction
pub trait ValueGenerator {
    /// Draw the next value
    fn sample_next(&mut self) -> f64;
}

impl<F> ValueGenerator for F
where
    F: FnMut() -> f64,
{
    fn sample_next(&mut self) -> f64 {
        self()
    }
}

/// A distribution paired with the generator that drives it
///
/// # Examples
///
/// ```
/// use dlinalg::{Sampler, ValueGenerator};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use rand_distr::Uniform;
///
/// let mut sampler = Sampler::new(Uniform::new(0.0, 1.0), StdRng::seed_from_u64(7));
/// let x = sampler.sample_next();
/// assert!((0.0..1.0).contains(&x));
/// ```
#[derive(Debug, Clone)]
pub struct Sampler<D, R> {
    distribution: D,
    rng: R,
}

impl<D, R> Sampler<D, R>
where
    D: Distribution<f64>,
    R: Rng,
{
    /// Sample `distribution` using `rng`
    pub fn new(distribution: D, rng: R) -> Self {
        Sampler { distribution, rng }
    }
}

impl Sampler<StandardNormal, ThreadRng> {
    /// Standard normal values from this thread's generator
    ///
    /// Not reproducible; every call starts from wherever the thread-local
    /// generator currently is.
    pub fn standard_normal() -> Self {
        Sampler::new(StandardNormal, rand::thread_rng())
    }
}

impl Sampler<StandardNormal, StdRng> {
    /// Reproducible standard normal values
    pub fn standard_normal_seeded(seed: u64) -> Self {
        Sampler::new(StandardNormal, StdRng::seed_from_u64(seed))
    }
}

impl<D, R> ValueGenerator for Sampler<D, R>
where
    D: Distribution<f64>,
    R: Rng,
{
    fn sample_next(&mut self) -> f64 {
        self.distribution.sample(&mut self.rng)
    }
}

/// Rectangular numeric table readable cell by cell
pub trait TabularSource {
    /// Number of rows
    fn row_count(&self) -> usize;

    /// Number of columns
    fn col_count(&self) -> usize;

    /// Value at `(row, col)` as `f64`
    fn get_double(&self, row: usize, col: usize) -> f64;
}
