// crates/v2x-reputation/src/noise.rs
//
// Precision noise for direct trust matrices and reputation vectors.
//
// Models sensor and measurement imprecision at the roadside unit: every
// off-diagonal cell of a freshly built direct matrix is perturbed by a
// uniformly sampled offset, then clamped back to [0, 1]. The same interval
// type can also shift each vehicle's new reputation before it is bounded. The random source
// is supplied by the caller so runs can be reproduced from a seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use v2x_core::V2xError;

use crate::trust_matrix::TrustMatrix;

/// Uniform offset interval `[low, high)` added to off-diagonal cells.
///
/// `low == high` applies a constant offset; `0.0, 0.0` disables the pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionNoise {
    pub low: f64,
    pub high: f64,
}

impl Default for PrecisionNoise {
    fn default() -> Self {
        Self {
            low: -0.2,
            high: 0.4,
        }
    }
}

impl PrecisionNoise {
    /// Create a noise interval.
    ///
    /// # Errors
    /// Returns `V2xError::Config` if `low > high` or either bound is not finite.
    pub fn new(low: f64, high: f64) -> Result<Self, V2xError> {
        let noise = Self { low, high };
        noise.validate()?;
        Ok(noise)
    }

    /// Check the interval bounds.
    pub fn validate(&self) -> Result<(), V2xError> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low > self.high {
            return Err(V2xError::Config(format!(
                "noise interval [{}, {}) is invalid",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Whether the pass leaves matrices untouched.
    pub fn is_disabled(&self) -> bool {
        self.low == 0.0 && self.high == 0.0
    }

    /// Draw one offset from the interval.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.low < self.high {
            rng.gen_range(self.low..self.high)
        } else {
            self.low
        }
    }

    /// One offset per vehicle, for perturbing a reputation vector. All zeros
    /// when the pass is disabled.
    pub fn offsets<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        if self.is_disabled() {
            return vec![0.0; n];
        }
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Perturb every off-diagonal cell of `matrix`.
    pub fn apply<R: Rng + ?Sized>(&self, matrix: &mut TrustMatrix, rng: &mut R) {
        if self.is_disabled() {
            return;
        }
        let n = matrix.size();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let offset = self.sample(rng);
                    matrix.set_trust(i, j, matrix.get_trust(i, j) + offset);
                }
            }
        }
    }
}
