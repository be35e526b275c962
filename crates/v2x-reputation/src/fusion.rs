// crates/v2x-reputation/src/fusion.rs
//
// Opinion fusion: combines direct and indirect trust into a comprehensive
// per-pair opinion. The strategy is chosen once per deployment.

use serde::{Deserialize, Serialize};

use v2x_core::V2xError;

use crate::trust_matrix::TrustMatrix;

/// Default weight of direct observation in weighted-linear fusion.
pub const DEFAULT_DIRECT_WEIGHT: f64 = 0.68;

/// Default weight of hearsay in weighted-linear fusion.
pub const DEFAULT_INDIRECT_WEIGHT: f64 = 0.32;

/// How direct and indirect trust are combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FusionStrategy {
    /// `direct_weight * direct + indirect_weight * indirect`.
    WeightedLinear {
        direct_weight: f64,
        indirect_weight: f64,
    },
    /// `p*q / (p*q + (1-p)*(1-q))`: rewards agreement between direct and
    /// indirect evidence and punishes disagreement.
    Bayesian,
}

impl Default for FusionStrategy {
    fn default() -> Self {
        FusionStrategy::WeightedLinear {
            direct_weight: DEFAULT_DIRECT_WEIGHT,
            indirect_weight: DEFAULT_INDIRECT_WEIGHT,
        }
    }
}

impl FusionStrategy {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            FusionStrategy::WeightedLinear { .. } => "weighted_linear",
            FusionStrategy::Bayesian => "bayesian",
        }
    }

    /// Check strategy parameters.
    pub fn validate(&self) -> Result<(), V2xError> {
        if let FusionStrategy::WeightedLinear {
            direct_weight,
            indirect_weight,
        } = self
        {
            if *direct_weight < 0.0 || *indirect_weight < 0.0 {
                return Err(V2xError::Config(
                    "fusion weights must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Fuse a single (direct, indirect) pair. The result is clamped to [0, 1].
    pub fn fuse_pair(&self, direct: f64, indirect: f64) -> f64 {
        let fused = match self {
            FusionStrategy::WeightedLinear {
                direct_weight,
                indirect_weight,
            } => direct_weight * direct + indirect_weight * indirect,
            FusionStrategy::Bayesian => bayesian_fusion(direct, indirect),
        };
        fused.clamp(0.0, 1.0)
    }

    /// Fuse two matrices cell by cell.
    ///
    /// # Errors
    /// Returns `V2xError::Validation` if the matrices differ in size.
    pub fn fuse(&self, direct: &TrustMatrix, indirect: &TrustMatrix) -> Result<TrustMatrix, V2xError> {
        let n = direct.size();
        if indirect.size() != n {
            return Err(V2xError::Validation(format!(
                "cannot fuse {}x{} direct with {}x{} indirect",
                n,
                n,
                indirect.size(),
                indirect.size()
            )));
        }
        let mut fused = TrustMatrix::new(n);
        for i in 0..n {
            for j in 0..n {
                fused.set_trust(i, j, self.fuse_pair(direct.get_trust(i, j), indirect.get_trust(i, j)));
            }
        }
        Ok(fused)
    }
}

/// Bayesian fusion of two independent trust estimates.
///
/// When the evidence is in total disagreement (one side exactly 0, the
/// other exactly 1) the denominator vanishes and the result is 0.
pub fn bayesian_fusion(p: f64, q: f64) -> f64 {
    let agree = p * q;
    let denominator = agree + (1.0 - p) * (1.0 - q);
    if denominator <= 0.0 {
        0.0
    } else {
        agree / denominator
    }
}

/// Each vehicle's aggregate opinion of the network (row means).
pub fn intermediary_opinion(fused: &TrustMatrix) -> Vec<f64> {
    fused.row_means()
}

/// How trusted each vehicle is by everyone else (column means over the
/// other raters). This is the opinion that drives reputation.
pub fn received_opinion(fused: &TrustMatrix) -> Vec<f64> {
    fused.column_means_excluding_diagonal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize, v: f64) -> TrustMatrix {
        TrustMatrix::from_rows(vec![vec![v; n]; n]).unwrap()
    }

    #[test]
    fn test_weighted_linear_reduces_to_common_value() {
        let strategy = FusionStrategy::default();
        for v in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let fused = strategy.fuse(&uniform(3, v), &uniform(3, v)).unwrap();
            for row in fused.rows() {
                for &cell in row {
                    assert!((cell - v).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_weighted_linear_weights() {
        let strategy = FusionStrategy::default();
        let fused = strategy.fuse_pair(1.0, 0.0);
        assert!((fused - DEFAULT_DIRECT_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn test_bayesian_boundaries() {
        assert!((bayesian_fusion(0.5, 0.5) - 0.5).abs() < 1e-15);
        assert_eq!(bayesian_fusion(1.0, 1.0), 1.0);
        assert_eq!(bayesian_fusion(0.0, 1.0), 0.0);
        assert_eq!(bayesian_fusion(1.0, 0.0), 0.0);
        assert_eq!(bayesian_fusion(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_bayesian_rewards_agreement() {
        assert!(bayesian_fusion(0.8, 0.8) > 0.8);
        assert!(bayesian_fusion(0.2, 0.2) < 0.2);
        let mixed = bayesian_fusion(0.8, 0.2);
        assert!((mixed - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bayesian_matrix_fusion() {
        let fused = FusionStrategy::Bayesian
            .fuse(&uniform(2, 0.5), &uniform(2, 0.5))
            .unwrap();
        assert!((fused.get_trust(0, 1) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let strategy = FusionStrategy::Bayesian;
        assert!(strategy.fuse(&uniform(2, 0.5), &uniform(3, 0.5)).is_err());
    }

    #[test]
    fn test_negative_weights_rejected() {
        let strategy = FusionStrategy::WeightedLinear {
            direct_weight: -0.1,
            indirect_weight: 1.1,
        };
        assert!(strategy.validate().is_err());
        assert!(FusionStrategy::Bayesian.validate().is_ok());
    }

    #[test]
    fn test_opinion_axes() {
        let fused = TrustMatrix::from_rows(vec![
            vec![0.0, 0.9, 0.9],
            vec![0.1, 0.0, 0.9],
            vec![0.1, 0.9, 0.0],
        ])
        .unwrap();
        let received = received_opinion(&fused);
        assert!((received[0] - 0.1).abs() < 1e-12);
        assert!((received[1] - 0.9).abs() < 1e-12);
        let intermediary = intermediary_opinion(&fused);
        assert!((intermediary[0] - 0.6).abs() < 1e-12);
    }
}
