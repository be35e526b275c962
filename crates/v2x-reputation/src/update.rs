// crates/v2x-reputation/src/update.rs
//
// Reputation update strategies for the V2X opinion ledger.
//
// Each recomputation cycle folds a vehicle's fused opinion and its recent
// history into a new reputation value. Two strategies are supported and one
// is chosen per deployment.

use serde::{Deserialize, Serialize};

use v2x_core::V2xError;

use crate::history::ReputationRecord;

/// Default history weight for the decayed-history sum.
pub const DEFAULT_HISTORY_WEIGHT: f64 = 0.15;

/// Default switching rate for the two-state blend.
pub const DEFAULT_SWITCH_RATE: f64 = 0.15;

/// How a new reputation value is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReputationStrategy {
    /// `opinion + g*h0 + g^2*h1 + g^3*h2`.
    ///
    /// Unclamped unless `clamp` is set: values above 1.0 read as "very
    /// trusted" downstream.
    DecayedHistory {
        g: f64,
        #[serde(default)]
        clamp: bool,
    },
    /// Two-state (trusted / untrusted) blend. The current reputation is
    /// propagated through `[[1-gamma, gamma], [gamma, 1-gamma]]` and weighted
    /// by the opinion. Always clamped to [0, 1].
    TwoState { gamma: f64 },
}

impl Default for ReputationStrategy {
    fn default() -> Self {
        ReputationStrategy::DecayedHistory {
            g: DEFAULT_HISTORY_WEIGHT,
            clamp: false,
        }
    }
}

impl ReputationStrategy {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ReputationStrategy::DecayedHistory { .. } => "decayed_history",
            ReputationStrategy::TwoState { .. } => "two_state",
        }
    }

    /// Check strategy parameters.
    pub fn validate(&self) -> Result<(), V2xError> {
        match self {
            ReputationStrategy::DecayedHistory { g, .. } if !(0.0..=1.0).contains(g) => Err(
                V2xError::Config(format!("history weight g={} must be within [0, 1]", g)),
            ),
            ReputationStrategy::TwoState { gamma } if !(0.0..=1.0).contains(gamma) => Err(
                V2xError::Config(format!("switch rate gamma={} must be within [0, 1]", gamma)),
            ),
            _ => Ok(()),
        }
    }

    /// Compute the next reputation value from an opinion and the history.
    pub fn next_reputation(&self, opinion: f64, history: &ReputationRecord) -> f64 {
        self.next_reputation_with_offset(opinion, history, 0.0)
    }

    /// Compute the next reputation value, shifted by `offset` before the
    /// strategy's bounds apply.
    pub fn next_reputation_with_offset(
        &self,
        opinion: f64,
        history: &ReputationRecord,
        offset: f64,
    ) -> f64 {
        let value = self.raw_reputation(opinion, history) + offset;
        match self {
            ReputationStrategy::DecayedHistory { clamp: false, .. } => value,
            _ => value.clamp(0.0, 1.0),
        }
    }

    /// Compute the next value and push it into the history.
    pub fn apply(&self, opinion: f64, history: &mut ReputationRecord) -> f64 {
        self.apply_with_offset(opinion, history, 0.0)
    }

    /// Compute the next value with an offset and push it into the history.
    pub fn apply_with_offset(
        &self,
        opinion: f64,
        history: &mut ReputationRecord,
        offset: f64,
    ) -> f64 {
        let value = self.next_reputation_with_offset(opinion, history, offset);
        history.push(value);
        value
    }

    fn raw_reputation(&self, opinion: f64, history: &ReputationRecord) -> f64 {
        let opinion = opinion.clamp(0.0, 1.0);
        let [h0, h1, h2] = *history.slots();
        match self {
            ReputationStrategy::DecayedHistory { g, .. } => {
                opinion + g * h0 + g.powi(2) * h1 + g.powi(3) * h2
            }
            ReputationStrategy::TwoState { gamma } => {
                let current = [h0, 1.0 - h0];
                let transition = [[1.0 - gamma, *gamma], [*gamma, 1.0 - gamma]];
                let trusted = transition[0][0] * current[0] + transition[0][1] * current[1];
                let untrusted = transition[1][0] * current[0] + transition[1][1] * current[1];
                opinion * trusted + (1.0 - opinion) * untrusted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decayed_history_formula() {
        let strategy = ReputationStrategy::default();
        let record = ReputationRecord::new();
        let g = DEFAULT_HISTORY_WEIGHT;
        let expected = 0.6 + g * 0.5 + g * g * 0.5 + g * g * g * 0.5;
        assert!((strategy.next_reputation(0.6, &record) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_decayed_history_can_exceed_one() {
        let strategy = ReputationStrategy::default();
        let mut record = ReputationRecord::new();
        let value = strategy.apply(1.0, &mut record);
        assert!(value > 1.0);
        assert_eq!(record.current(), value);
    }

    #[test]
    fn test_decayed_history_clamp_flag() {
        let strategy = ReputationStrategy::DecayedHistory {
            g: DEFAULT_HISTORY_WEIGHT,
            clamp: true,
        };
        let record = ReputationRecord::new();
        assert_eq!(strategy.next_reputation(1.0, &record), 1.0);
    }

    #[test]
    fn test_two_state_neutral_fixed_point() {
        // A neutral history with a neutral opinion stays neutral.
        let strategy = ReputationStrategy::TwoState { gamma: 0.15 };
        let record = ReputationRecord::new();
        assert!((strategy.next_reputation(0.5, &record) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_two_state_formula() {
        let gamma = 0.15;
        let strategy = ReputationStrategy::TwoState { gamma };
        let mut record = ReputationRecord::new();
        record.push(0.8);
        let trusted = (1.0 - gamma) * 0.8 + gamma * 0.2;
        let untrusted = gamma * 0.8 + (1.0 - gamma) * 0.2;
        let expected = 0.9 * trusted + 0.1 * untrusted;
        assert!((strategy.next_reputation(0.9, &record) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_two_state_stays_bounded() {
        let strategy = ReputationStrategy::TwoState { gamma: 0.15 };
        let mut record = ReputationRecord::new();
        for opinion in [1.0, 1.0, 0.0, 0.3, 1.0, 0.0] {
            let v = strategy.apply(opinion, &mut record);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_apply_shifts_history() {
        let strategy = ReputationStrategy::TwoState { gamma: 0.0 };
        let mut record = ReputationRecord::new();
        // gamma = 0 makes the update the identity on trusted mass:
        // new = o*h0 + (1-o)*(1-h0).
        strategy.apply(1.0, &mut record);
        assert_eq!(record.slots(), &[0.5, 0.5, 0.5]);
        record.push(0.9);
        let v = strategy.apply(1.0, &mut record);
        assert!((v - 0.9).abs() < 1e-12);
        assert_eq!(record.slots()[1], 0.9);
    }

    #[test]
    fn test_offset_applies_before_bounds() {
        let record = ReputationRecord::new();
        let two_state = ReputationStrategy::TwoState { gamma: 0.15 };
        assert!((two_state.next_reputation_with_offset(0.9, &record, 0.1) - 0.6).abs() < 1e-12);
        assert_eq!(two_state.next_reputation_with_offset(0.9, &record, 0.8), 1.0);
        assert_eq!(two_state.next_reputation_with_offset(0.9, &record, -0.8), 0.0);

        let decayed = ReputationStrategy::default();
        let base = decayed.next_reputation(1.0, &record);
        let shifted = decayed.next_reputation_with_offset(1.0, &record, 0.3);
        assert!((shifted - base - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(ReputationStrategy::TwoState { gamma: 1.5 }.validate().is_err());
        assert!(ReputationStrategy::DecayedHistory { g: -0.1, clamp: false }
            .validate()
            .is_err());
        assert!(ReputationStrategy::default().validate().is_ok());
    }
}
