// crates/v2x-consensus/src/validators.rs
//
// Validator registry: identity -> opinion (voting weight and stake).
//
// Validators are kept in insertion order. Selection is a roulette wheel over
// that order, so a validator's chance of forging the next block is its share
// of the total opinion. Opinion has no upper bound: it drops when a
// validator stakes and grows with every forge reward.
//
// The registry does not enforce the eligibility threshold. Callers decide who
// gets registered.

use rand::Rng;
use serde::{Deserialize, Serialize};

use v2x_core::V2xError;

/// Opinion assigned to validators registered without an explicit value.
pub const DEFAULT_OPINION: f64 = 0.5;

/// A registered validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    /// Ledger identity, e.g. `vehicle_3`.
    pub id: String,
    /// Current opinion. Used as selection weight and as stakeable balance.
    pub opinion: f64,
}

/// Insertion-ordered set of validators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorRegistry {
    validators: Vec<Validator>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Register a validator, or overwrite the opinion of an existing one.
    ///
    /// Re-registering keeps the validator's original position.
    pub fn add_validator(&mut self, id: &str, opinion: f64) {
        match self.validators.iter_mut().find(|v| v.id == id) {
            Some(existing) => existing.opinion = opinion,
            None => self.validators.push(Validator {
                id: id.to_string(),
                opinion,
            }),
        }
    }

    /// Stake `stake` out of a validator's opinion.
    ///
    /// Returns the amount actually staked: `stake` if the validator could
    /// cover it, otherwise 0 and the opinion is left unchanged.
    ///
    /// # Errors
    /// Returns `V2xError::UnknownValidator` if `id` is not registered.
    pub fn delegate_opinion(&mut self, id: &str, stake: f64) -> Result<f64, V2xError> {
        let validator = self
            .validators
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| V2xError::UnknownValidator(id.to_string()))?;
        if validator.opinion >= stake {
            validator.opinion -= stake;
            Ok(stake)
        } else {
            Ok(0.0)
        }
    }

    /// Credit a forge reward. Unknown validators are ignored and `false`
    /// is returned.
    pub fn reward(&mut self, id: &str, amount: f64) -> bool {
        match self.validators.iter_mut().find(|v| v.id == id) {
            Some(v) => {
                v.opinion += amount;
                true
            }
            None => false,
        }
    }

    /// Pick a validator with probability proportional to its opinion.
    ///
    /// # Errors
    /// Returns `V2xError::NoEligibleValidator` when the registry is empty or
    /// the total opinion is not positive.
    pub fn select_validator<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, V2xError> {
        let total = self.total_opinion();
        if total.is_nan() || total <= 0.0 {
            return Err(V2xError::NoEligibleValidator);
        }
        let pick = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for validator in &self.validators {
            cumulative += validator.opinion.max(0.0);
            if pick < cumulative {
                return Ok(validator.id.clone());
            }
        }
        // Floating-point rounding can leave `pick` just past the last bucket.
        self.validators
            .iter()
            .rev()
            .find(|v| v.opinion > 0.0)
            .map(|v| v.id.clone())
            .ok_or(V2xError::NoEligibleValidator)
    }

    /// Pick a validator uniformly, ignoring opinion.
    pub fn select_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, V2xError> {
        if self.validators.is_empty() {
            return Err(V2xError::NoEligibleValidator);
        }
        let index = rng.gen_range(0..self.validators.len());
        Ok(self.validators[index].id.clone())
    }

    /// Sum of all non-negative opinions.
    pub fn total_opinion(&self) -> f64 {
        self.validators.iter().map(|v| v.opinion.max(0.0)).sum()
    }

    pub fn opinion(&self, id: &str) -> Option<f64> {
        self.validators.iter().find(|v| v.id == id).map(|v| v.opinion)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.validators.iter().any(|v| v.id == id)
    }

    /// All validators in insertion order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
