// crates/v2x-consensus/src/strategy.rs
//
// Forger selection strategies.
//
// The forging path only asks a strategy who seals the next block (and with
// which proof, if any). Three strategies exist:
//   - OpinionProportional: roulette selection weighted by validator opinion,
//     with the winner staking before it seals.
//   - Unweighted: uniform choice among registered validators.
//   - ProofOfWork: a bounded nonce search over the tip's hash; the
//     configured miner forges whenever a proof is found.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use v2x_core::crypto::sha256_hex;
use v2x_core::{Block, V2xError};

use crate::validators::ValidatorRegistry;

/// Who forges the next block, and the proof they found.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgerSelection {
    pub validator: String,
    pub proof: Option<u64>,
}

impl ForgerSelection {
    fn without_proof(validator: String) -> Self {
        Self {
            validator,
            proof: None,
        }
    }
}

/// Strategy deciding the forger of the next block.
pub trait ConsensusStrategy: Send + Sync {
    /// Consensus type reported alongside the chain.
    fn name(&self) -> &'static str;

    /// Whether the selected forger must stake before sealing.
    fn requires_stake(&self) -> bool;

    /// Select the forger for the block following `tip`.
    ///
    /// # Errors
    /// `NoEligibleValidator` when nobody can be selected, or
    /// `ProofSearchExhausted` when a proof search runs out of attempts.
    fn select_forger(
        &self,
        registry: &ValidatorRegistry,
        tip: &Block,
        rng: &mut dyn RngCore,
    ) -> Result<ForgerSelection, V2xError>;
}

/// Opinion-weighted delegated selection.
#[derive(Debug, Clone, Default)]
pub struct OpinionProportional;

impl ConsensusStrategy for OpinionProportional {
    fn name(&self) -> &'static str {
        "DPoS"
    }

    fn requires_stake(&self) -> bool {
        true
    }

    fn select_forger(
        &self,
        registry: &ValidatorRegistry,
        _tip: &Block,
        rng: &mut dyn RngCore,
    ) -> Result<ForgerSelection, V2xError> {
        registry
            .select_validator(rng)
            .map(ForgerSelection::without_proof)
    }
}

/// Uniform selection, opinion ignored.
#[derive(Debug, Clone, Default)]
pub struct Unweighted;

impl ConsensusStrategy for Unweighted {
    fn name(&self) -> &'static str {
        "Unweighted"
    }

    fn requires_stake(&self) -> bool {
        false
    }

    fn select_forger(
        &self,
        registry: &ValidatorRegistry,
        _tip: &Block,
        rng: &mut dyn RngCore,
    ) -> Result<ForgerSelection, V2xError> {
        registry
            .select_uniform(rng)
            .map(ForgerSelection::without_proof)
    }
}

/// Default nonce budget. At difficulty 4 a proof takes about 65k digests on
/// average, so the search gives up with a probability near 0.05%.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 500_000;

/// Bounded hash-prefix search.
///
/// The search runs synchronously on the calling task while the ledger lock
/// is held, so `max_attempts` bounds how long a forge can block other
/// ledger calls.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    /// Required number of leading `0` hex digits.
    pub difficulty: usize,
    /// Nonces tried before giving up.
    pub max_attempts: u64,
    /// Identity recorded as forger of mined blocks.
    pub miner_id: String,
}

impl ProofOfWork {
    /// Search nonces `0..max_attempts` for one whose digest of
    /// `previous_hash ‖ nonce` has the required prefix.
    pub fn find_proof(&self, previous_hash: &str) -> Result<u64, V2xError> {
        (0..self.max_attempts)
            .find(|nonce| Self::is_valid(previous_hash, *nonce, self.difficulty))
            .ok_or(V2xError::ProofSearchExhausted(self.max_attempts))
    }

    /// Whether `nonce` satisfies `difficulty` for `previous_hash`.
    pub fn is_valid(previous_hash: &str, nonce: u64, difficulty: usize) -> bool {
        let digest = sha256_hex(format!("{}{}", previous_hash, nonce).as_bytes());
        digest.starts_with(&"0".repeat(difficulty))
    }
}

impl ConsensusStrategy for ProofOfWork {
    fn name(&self) -> &'static str {
        "PoW"
    }

    fn requires_stake(&self) -> bool {
        false
    }

    fn select_forger(
        &self,
        _registry: &ValidatorRegistry,
        tip: &Block,
        _rng: &mut dyn RngCore,
    ) -> Result<ForgerSelection, V2xError> {
        let proof = self.find_proof(&tip.hash()?)?;
        tracing::debug!(proof, difficulty = self.difficulty, "Proof of work found");
        Ok(ForgerSelection {
            validator: self.miner_id.clone(),
            proof: Some(proof),
        })
    }
}

fn default_difficulty() -> usize {
    4
}

fn default_max_attempts() -> u64 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_miner_id() -> String {
    "rsu1".to_string()
}

/// Configured consensus strategy, chosen once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ConsensusKind {
    #[default]
    OpinionProportional,
    Unweighted,
    ProofOfWork {
        #[serde(default = "default_difficulty")]
        difficulty: usize,
        #[serde(default = "default_max_attempts")]
        max_attempts: u64,
        #[serde(default = "default_miner_id")]
        miner_id: String,
    },
}

impl ConsensusKind {
    /// Instantiate the configured strategy.
    ///
    /// # Errors
    /// Returns `V2xError::Config` for a proof-of-work difficulty beyond the
    /// 64 hex digits of a SHA-256 digest or a zero attempt budget.
    pub fn build(&self) -> Result<Box<dyn ConsensusStrategy>, V2xError> {
        match self {
            ConsensusKind::OpinionProportional => Ok(Box::new(OpinionProportional)),
            ConsensusKind::Unweighted => Ok(Box::new(Unweighted)),
            ConsensusKind::ProofOfWork {
                difficulty,
                max_attempts,
                miner_id,
            } => {
                if *difficulty > 64 {
                    return Err(V2xError::Config(format!(
                        "proof-of-work difficulty {} exceeds 64 hex digits",
                        difficulty
                    )));
                }
                if *max_attempts == 0 {
                    return Err(V2xError::Config(
                        "proof-of-work max_attempts must be positive".into(),
                    ));
                }
                Ok(Box::new(ProofOfWork {
                    difficulty: *difficulty,
                    max_attempts: *max_attempts,
                    miner_id: miner_id.clone(),
                }))
            }
        }
    }
}
