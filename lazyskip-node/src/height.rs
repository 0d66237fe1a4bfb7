use rand::Rng;

use crate::error::{Error, Result};

pub const DEFAULT_P: f64 = 0.5;
pub const DEFAULT_MAX_HEIGHT: usize = 32;

/// Draws node heights from a geometric law shifted by one, so that
/// `P(height > k) = (1 - p)^k`, clamped to `[1, max_height]`.
#[derive(Debug, Clone, Copy)]
pub struct HeightSampler {
    p: f64,
    max_height: usize,
    // ln(1 - p), always finite and negative
    log_q: f64,
}

impl Default for HeightSampler {
    fn default() -> Self {
        Self {
            p: DEFAULT_P,
            max_height: DEFAULT_MAX_HEIGHT,
            log_q: (1.0 - DEFAULT_P).ln(),
        }
    }
}

impl HeightSampler {
    pub fn new(p: f64, max_height: usize) -> Result<Self> {
        // also rejects NaN
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::InvalidProbability(p));
        }
        let log_q = (1.0 - p).ln();
        // 1 - p rounds to 1 for tiny p
        if !(log_q.is_finite() && log_q < 0.0) {
            return Err(Error::InvalidProbability(p));
        }
        if max_height == 0 {
            return Err(Error::InvalidMaxHeight(max_height));
        }

        Ok(Self {
            p,
            max_height,
            log_q,
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Inverts the geometric CDF for a uniform draw `y` in `(0, 1]`.
    /// The result is not clamped.
    pub fn height_for(&self, y: f64) -> usize {
        // float -> int casts saturate, so y == 0 maps to usize::MAX
        (y.ln() / self.log_q).ceil() as usize
    }

    pub fn clamp(&self, height: usize) -> usize {
        height.clamp(1, self.max_height)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        // [0, 1) -> (0, 1]
        let y = 1.0 - rng.random::<f64>();
        self.clamp(self.height_for(y))
    }

    pub fn sample_n<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}
