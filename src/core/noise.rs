/// Source of uniform samples in `[0, 1)` used to perturb generated series.
pub trait NoiseSource {
    fn next_unit(&mut self) -> f64;

    /// Sample shifted to `[-0.5, 0.5)`.
    fn centered(&mut self) -> f64 {
        self.next_unit() - 0.5
    }
}

/// Always returns the same sample. `FixedNoise(0.5)` zeroes every centered
/// perturbation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedNoise(pub f64);

impl FixedNoise {
    pub fn silent() -> Self {
        Self(0.5)
    }
}

impl NoiseSource for FixedNoise {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Seeded xorshift generator.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        let mixed = splitmix64(seed);
        let state = if mixed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            mixed
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl NoiseSource for Rng {
    fn next_unit(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 / DENOM
    }
}

/// Fresh seed from the operating system's generator, for sessions that were
/// not given one.
pub fn entropy_seed() -> u64 {
    rand::random()
}

/// Mixes `parts` into `base_seed`, giving each distinct `parts` its own stream
/// under one base seed.
pub fn derive_seed(base_seed: u64, parts: &[u64]) -> u64 {
    parts
        .iter()
        .fold(splitmix64(base_seed), |acc, &part| splitmix64(acc ^ part))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
