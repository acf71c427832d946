use crate::prelude::*;
use ndarray_rand::rand_distr::StandardNormal;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Value used by the reference behavior for every weight and bias.
pub const DEFAULT_INIT_VALUE: f64 = 0.1;

/// Policy used by `Model::build_with` to fill weight and bias matrices.
pub trait Initializer {
    fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64>;

    /// Weights `(width, prev)` and biases `(width, 1)` of one layer.
    fn initialize_layer(&mut self, prev: usize, width: usize) -> (Array2<f64>, Array2<f64>) {
        (self.initialize((width, prev)), self.initialize((width, 1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl Default for Constant {
    fn default() -> Self {
        Constant(DEFAULT_INIT_VALUE)
    }
}

impl Initializer for Constant {
    fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64> {
        Array2::from_elem(shape, self.0)
    }
}

pub struct RandomUniform {
    dist: Uniform<f64>,
    rng: StdRng,
}

impl RandomUniform {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        Self::build(low, high, StdRng::from_entropy())
    }

    pub fn seeded(low: f64, high: f64, seed: u64) -> Result<Self> {
        Self::build(low, high, StdRng::seed_from_u64(seed))
    }

    fn build(low: f64, high: f64, rng: StdRng) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(NNError::ConfigError(format!(
                "uniform initialization needs finite low < high, got [{}, {})",
                low, high
            )));
        }
        Ok(Self {
            dist: Uniform::new(low, high),
            rng,
        })
    }
}

impl Initializer for RandomUniform {
    fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64> {
        Array2::random_using(shape, self.dist, &mut self.rng)
    }
}

pub struct Gaussian {
    mean: f64,
    std_dev: f64,
    rng: StdRng,
}

impl Gaussian {
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        Self::build(mean, std_dev, StdRng::from_entropy())
    }

    pub fn seeded(mean: f64, std_dev: f64, seed: u64) -> Result<Self> {
        Self::build(mean, std_dev, StdRng::seed_from_u64(seed))
    }

    fn build(mean: f64, std_dev: f64, rng: StdRng) -> Result<Self> {
        if !(mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0) {
            return Err(NNError::ConfigError(format!(
                "gaussian initialization needs a finite mean and std_dev >= 0, got N({}, {})",
                mean, std_dev
            )));
        }
        Ok(Self { mean, std_dev, rng })
    }
}

impl Initializer for Gaussian {
    fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64> {
        normal(shape, self.std_dev, &mut self.rng) + self.mean
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    Uniform,
    Normal,
}

/// Glorot scaling, variance `2 / (fan_in + fan_out)`.
pub struct Xavier {
    sampling: Sampling,
    rng: StdRng,
}

impl Xavier {
    pub fn new(sampling: Sampling) -> Self {
        Self { sampling, rng: StdRng::from_entropy() }
    }

    pub fn seeded(sampling: Sampling, seed: u64) -> Self {
        Self { sampling, rng: StdRng::seed_from_u64(seed) }
    }

    fn std_dev(fan_in: usize, fan_out: usize) -> f64 {
        (2.0 / (fan_in + fan_out).max(1) as f64).sqrt()
    }
}

impl Initializer for Xavier {
    fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64> {
        let std_dev = Self::std_dev(shape.1, shape.0);
        scaled(self.sampling, std_dev, shape, &mut self.rng)
    }

    // biases share the scale of the weights they sit next to
    fn initialize_layer(&mut self, prev: usize, width: usize) -> (Array2<f64>, Array2<f64>) {
        let std_dev = Self::std_dev(prev, width);
        (
            scaled(self.sampling, std_dev, (width, prev), &mut self.rng),
            scaled(self.sampling, std_dev, (width, 1), &mut self.rng),
        )
    }
}

/// LeCun scaling, variance `1 / fan_in`.
pub struct LeCun {
    sampling: Sampling,
    rng: StdRng,
}

impl LeCun {
    pub fn new(sampling: Sampling) -> Self {
        Self { sampling, rng: StdRng::from_entropy() }
    }

    pub fn seeded(sampling: Sampling, seed: u64) -> Self {
        Self { sampling, rng: StdRng::seed_from_u64(seed) }
    }

    fn std_dev(fan_in: usize) -> f64 {
        (1.0 / fan_in.max(1) as f64).sqrt()
    }
}

impl Initializer for LeCun {
    fn initialize(&mut self, shape: (usize, usize)) -> Array2<f64> {
        scaled(self.sampling, Self::std_dev(shape.1), shape, &mut self.rng)
    }

    fn initialize_layer(&mut self, prev: usize, width: usize) -> (Array2<f64>, Array2<f64>) {
        let std_dev = Self::std_dev(prev);
        (
            scaled(self.sampling, std_dev, (width, prev), &mut self.rng),
            scaled(self.sampling, std_dev, (width, 1), &mut self.rng),
        )
    }
}

fn normal(shape: (usize, usize), std_dev: f64, rng: &mut StdRng) -> Array2<f64> {
    Array2::<f64>::random_using(shape, StandardNormal, rng) * std_dev
}

// A uniform on [-l, l) has standard deviation l / sqrt(3).
fn scaled(sampling: Sampling, std_dev: f64, shape: (usize, usize), rng: &mut StdRng) -> Array2<f64> {
    match sampling {
        Sampling::Normal => normal(shape, std_dev, rng),
        Sampling::Uniform => {
            let limit = 3f64.sqrt() * std_dev;
            Array2::random_using(shape, Uniform::new(-limit, limit), rng)
        }
    }
}
