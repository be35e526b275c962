// crates/v2x-consensus/src/service.rs
//
// LedgerService: the ledger boundary shared by the RPC server and the batch
// coordinator.
//
// The ledger, the validator registry, and the selection RNG sit behind one
// async mutex that is held for the whole of each logical operation. Forging
// (select, stake, seal, reward) therefore can never interleave with a
// submission or another forge. Payload encryption and decryption run
// outside the lock.

use std::sync::Arc;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use v2x_core::{Block, PayloadCipher, V2xError};

use crate::ledger::Ledger;
use crate::strategy::{ConsensusKind, ConsensusStrategy};
use crate::validators::{Validator, ValidatorRegistry, DEFAULT_OPINION};

fn default_stake_amount() -> f64 {
    0.1
}

fn default_forge_reward() -> f64 {
    0.1
}

/// Ledger settings (`[ledger]` in the daemon config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub consensus: ConsensusKind,
    /// Opinion the selected forger stakes before sealing.
    #[serde(default = "default_stake_amount")]
    pub stake_amount: f64,
    /// Opinion credited to the forger after sealing.
    #[serde(default = "default_forge_reward")]
    pub forge_reward: f64,
    /// Hex-encoded 32-byte payload key. A random key is used when absent.
    #[serde(default)]
    pub cipher_key: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            consensus: ConsensusKind::default(),
            stake_amount: default_stake_amount(),
            forge_reward: default_forge_reward(),
            cipher_key: None,
        }
    }
}

/// Result of a forge attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForgeOutcome {
    /// A new block was appended.
    Sealed { block: Block },
    /// The selected validator could not cover the stake; nothing changed.
    StakeRejected { validator: String },
}

/// Full chain as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainView {
    pub consensus_type: String,
    pub chain: Vec<Block>,
    pub length: usize,
}

struct LedgerState {
    ledger: Ledger,
    registry: ValidatorRegistry,
    rng: StdRng,
}

/// Shared, lock-protected ledger plus validator registry.
pub struct LedgerService {
    state: Mutex<LedgerState>,
    cipher: Arc<dyn PayloadCipher>,
    strategy: Box<dyn ConsensusStrategy>,
    stake_amount: f64,
    forge_reward: f64,
    rsu_id: String,
}

impl LedgerService {
    /// Build a service from configuration.
    ///
    /// # Errors
    /// Returns `V2xError::Config` for an invalid consensus configuration or
    /// negative stake/reward amounts.
    pub fn new(
        config: &LedgerConfig,
        cipher: Arc<dyn PayloadCipher>,
        rsu_id: impl Into<String>,
        rng: StdRng,
    ) -> Result<Self, V2xError> {
        if config.stake_amount < 0.0 || config.forge_reward < 0.0 {
            return Err(V2xError::Config(
                "stake_amount and forge_reward must be non-negative".into(),
            ));
        }
        Ok(Self {
            state: Mutex::new(LedgerState {
                ledger: Ledger::new(),
                registry: ValidatorRegistry::new(),
                rng,
            }),
            cipher,
            strategy: config.consensus.build()?,
            stake_amount: config.stake_amount,
            forge_reward: config.forge_reward,
            rsu_id: rsu_id.into(),
        })
    }

    /// Consensus type name reported with the chain.
    pub fn consensus_type(&self) -> &'static str {
        self.strategy.name()
    }

    /// Encrypt a message and admit it into the pending pool.
    ///
    /// Returns the index of the block it will be sealed into.
    ///
    /// # Errors
    /// `Validation` for an empty sender or receiver, `DuplicateTransaction`
    /// if the same sender already has the same message pending, or `Cipher`.
    pub async fn submit_transaction(
        &self,
        sender: &str,
        receiver: &str,
        plaintext: &str,
    ) -> Result<u64, V2xError> {
        if sender.trim().is_empty() || receiver.trim().is_empty() {
            return Err(V2xError::Validation(
                "senderVehicle and receiverVehicle are required".into(),
            ));
        }
        let ciphertext = self.cipher.encrypt(plaintext)?;
        let mut state = self.state.lock().await;
        match state.ledger.submit(sender, receiver, &ciphertext, &self.rsu_id) {
            Ok(index) => Ok(index),
            Err(e) => {
                tracing::debug!(sender, receiver, "Rejected duplicate transaction");
                Err(e)
            }
        }
    }

    /// Select a forger, stake, seal the pending pool, and credit the reward.
    ///
    /// Everything runs under the ledger lock. With proof of work that
    /// includes the nonce search, bounded by its `max_attempts`.
    ///
    /// # Errors
    /// `NoEligibleValidator` when selection is impossible,
    /// `ProofSearchExhausted` when proof of work gives up.
    pub async fn forge(&self) -> Result<ForgeOutcome, V2xError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let selection =
            self.strategy
                .select_forger(&state.registry, state.ledger.last_block(), &mut state.rng)?;

        if self.strategy.requires_stake() {
            let staked = state
                .registry
                .delegate_opinion(&selection.validator, self.stake_amount)?;
            if staked <= 0.0 && self.stake_amount > 0.0 {
                tracing::info!(
                    validator = %selection.validator,
                    stake = self.stake_amount,
                    "Stake rejected, block not forged"
                );
                return Ok(ForgeOutcome::StakeRejected {
                    validator: selection.validator,
                });
            }
        }

        let block = state
            .ledger
            .seal_with_proof(&selection.validator, selection.proof)?
            .clone();
        let rewarded = state.registry.reward(&selection.validator, self.forge_reward);

        tracing::info!(
            index = block.index,
            validator = %block.validator,
            transactions = block.transactions.len(),
            rewarded,
            consensus = self.strategy.name(),
            "Block forged"
        );
        Ok(ForgeOutcome::Sealed { block })
    }

    /// Decrypt a sealed transaction by 1-based block and transaction index.
    pub async fn decrypt_transaction(&self, block: u64, tx: u64) -> Result<String, V2xError> {
        let ciphertext = {
            let state = self.state.lock().await;
            state.ledger.transaction(block, tx)?.v2x_message.clone()
        };
        self.cipher.decrypt(&ciphertext)
    }

    /// Snapshot of the whole chain.
    pub async fn chain(&self) -> ChainView {
        let state = self.state.lock().await;
        let chain = state.ledger.chain().to_vec();
        ChainView {
            consensus_type: self.strategy.name().to_string(),
            length: chain.len(),
            chain,
        }
    }

    /// Verify every hash link of the chain.
    pub async fn verify_chain(&self) -> Result<(), V2xError> {
        self.state.lock().await.ledger.verify()
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.ledger.pending().len()
    }

    /// Register (or overwrite) a validator. Defaults to the neutral opinion.
    pub async fn add_validator(&self, id: &str, opinion: Option<f64>) -> Result<(), V2xError> {
        if id.trim().is_empty() {
            return Err(V2xError::Validation("validator id is required".into()));
        }
        let opinion = opinion.unwrap_or(DEFAULT_OPINION);
        self.state.lock().await.registry.add_validator(id, opinion);
        tracing::debug!(validator = id, opinion, "Validator registered");
        Ok(())
    }

    /// Stake opinion from a validator. Returns the amount actually staked.
    pub async fn stake_validator(&self, id: &str, amount: f64) -> Result<f64, V2xError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(V2xError::Validation(format!(
                "stake amount must be positive, got {}",
                amount
            )));
        }
        self.state.lock().await.registry.delegate_opinion(id, amount)
    }

    /// Upsert a batch of validators under a single lock acquisition.
    pub async fn refresh_validators(&self, entries: &[(String, f64)]) {
        let mut state = self.state.lock().await;
        for (id, opinion) in entries {
            state.registry.add_validator(id, *opinion);
        }
        tracing::info!(
            refreshed = entries.len(),
            total = state.registry.len(),
            "Validators refreshed"
        );
    }

    /// Snapshot of all validators in registration order.
    pub async fn validators(&self) -> Vec<Validator> {
        self.state.lock().await.registry.validators().to_vec()
    }
}
