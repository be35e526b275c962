// crates/v2x-core/src/block.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::canonical_hash;
use crate::error::V2xError;

/// Link value stored in the genesis block in place of a previous hash.
pub const GENESIS_PREVIOUS_HASH: &str = "0000";

/// Validator identity recorded on the genesis block.
pub const GENESIS_VALIDATOR: &str = "genesisValidator";

/// A V2X message transaction.
///
/// The payload is always ciphertext; plaintext never reaches the ledger.
/// Uniqueness within the pending pool is keyed on (sender, ciphertext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction identifier (UUIDv7, time-ordered).
    pub transaction_id: Uuid,
    /// Ledger identity of the sending vehicle.
    pub sender_vehicle: String,
    /// Ledger identity of the receiving vehicle.
    pub receiver_vehicle: String,
    /// Encrypted message payload.
    pub v2x_message: String,
    /// Roadside unit that admitted the transaction.
    pub rsu_id: String,
}

impl Transaction {
    /// Create a new transaction with a fresh id.
    pub fn new(
        sender_vehicle: impl Into<String>,
        receiver_vehicle: impl Into<String>,
        v2x_message: impl Into<String>,
        rsu_id: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: Uuid::now_v7(),
            sender_vehicle: sender_vehicle.into(),
            receiver_vehicle: receiver_vehicle.into(),
            v2x_message: v2x_message.into(),
            rsu_id: rsu_id.into(),
        }
    }

    /// Whether two transactions collide on the (sender, ciphertext) key.
    pub fn same_key(&self, other: &Transaction) -> bool {
        self.sender_vehicle == other.sender_vehicle && self.v2x_message == other.v2x_message
    }
}

/// A sealed ledger block.
///
/// Immutable once appended. `previous_hash` links to the canonical hash of
/// the preceding block, or holds [`GENESIS_PREVIOUS_HASH`] for block 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Wall-clock time at which the block was sealed.
    pub timestamp: DateTime<Utc>,
    /// Sealed transactions, in arrival order.
    pub transactions: Vec<Transaction>,
    /// Identity of the validator that forged this block.
    pub validator: String,
    /// Hash of the previous block.
    pub previous_hash: String,
    /// Proof-of-work nonce, present only on blocks forged by work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<u64>,
}

impl Block {
    /// The chain root: index 1, no transactions, sentinel link and forger.
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: Utc::now(),
            transactions: Vec::new(),
            validator: GENESIS_VALIDATOR.to_string(),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            proof: None,
        }
    }

    /// Canonical content hash of this block (SHA-256, lowercase hex).
    pub fn hash(&self) -> Result<String, V2xError> {
        canonical_hash(self)
    }

    /// Whether this block is the chain root.
    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }
}
