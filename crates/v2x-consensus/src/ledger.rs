// crates/v2x-consensus/src/ledger.rs
//
// The append-only block chain and its pending transaction pool.
//
// Block 1 is the genesis block, created with the ledger. Every later block
// seals the whole pending pool in arrival order and links to the canonical
// hash of its predecessor. The pool is emptied exactly when a block is
// sealed.

use chrono::Utc;

use v2x_core::{Block, Transaction, V2xError, GENESIS_PREVIOUS_HASH};

/// Chain of sealed blocks plus the pool of transactions awaiting a forger.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
        }
    }

    /// Admit a transaction into the pending pool.
    ///
    /// Returns the index of the block the transaction will be sealed into.
    ///
    /// # Errors
    /// Returns `V2xError::DuplicateTransaction` if the same sender already
    /// has the same ciphertext pending.
    pub fn submit(
        &mut self,
        sender: &str,
        receiver: &str,
        ciphertext: &str,
        rsu_id: &str,
    ) -> Result<u64, V2xError> {
        let transaction = Transaction::new(sender, receiver, ciphertext, rsu_id);
        if self.pending.iter().any(|t| t.same_key(&transaction)) {
            return Err(V2xError::DuplicateTransaction {
                sender: sender.to_string(),
            });
        }
        self.pending.push(transaction);
        Ok(self.last_block().index + 1)
    }

    /// Seal the pending pool into a new block forged by `validator`.
    pub fn seal(&mut self, validator: &str) -> Result<&Block, V2xError> {
        self.seal_with_proof(validator, None)
    }

    /// Seal the pending pool, recording a proof-of-work nonce on the block.
    ///
    /// # Errors
    /// Returns `V2xError::Serialization` if the previous block cannot be
    /// hashed. The pool is left intact in that case.
    pub fn seal_with_proof(&mut self, validator: &str, proof: Option<u64>) -> Result<&Block, V2xError> {
        let last = self.last_block();
        let index = last.index + 1;
        let previous_hash = last.hash()?;
        let block = Block {
            index,
            timestamp: Utc::now(),
            transactions: std::mem::take(&mut self.pending),
            validator: validator.to_string(),
            previous_hash,
            proof,
        };
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// The most recently sealed block. The chain is never empty.
    pub fn last_block(&self) -> &Block {
        &self.chain[self.chain.len() - 1]
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the genesis block exists from construction.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Look up a block by its 1-based index.
    ///
    /// # Errors
    /// Returns `V2xError::IndexOutOfRange` if no such block exists.
    pub fn block(&self, index: u64) -> Result<&Block, V2xError> {
        index
            .checked_sub(1)
            .and_then(|i| self.chain.get(i as usize))
            .ok_or_else(|| {
                V2xError::IndexOutOfRange(format!(
                    "block {} (chain has {} blocks)",
                    index,
                    self.chain.len()
                ))
            })
    }

    /// Look up a sealed transaction by 1-based block and transaction index.
    ///
    /// # Errors
    /// Returns `V2xError::IndexOutOfRange` if either index is out of range.
    pub fn transaction(&self, block_index: u64, tx_index: u64) -> Result<&Transaction, V2xError> {
        let block = self.block(block_index)?;
        tx_index
            .checked_sub(1)
            .and_then(|i| block.transactions.get(i as usize))
            .ok_or_else(|| {
                V2xError::IndexOutOfRange(format!(
                    "transaction {} of block {} (block has {} transactions)",
                    tx_index,
                    block_index,
                    block.transactions.len()
                ))
            })
    }

    /// Check indices and hash links across the whole chain.
    ///
    /// # Errors
    /// Returns `V2xError::Validation` naming the first broken block.
    pub fn verify(&self) -> Result<(), V2xError> {
        for (position, block) in self.chain.iter().enumerate() {
            let expected_index = position as u64 + 1;
            if block.index != expected_index {
                return Err(V2xError::Validation(format!(
                    "block at position {} has index {}",
                    expected_index, block.index
                )));
            }
            let expected_link = match position {
                0 => GENESIS_PREVIOUS_HASH.to_string(),
                _ => self.chain[position - 1].hash()?,
            };
            if block.previous_hash != expected_link {
                return Err(V2xError::Validation(format!(
                    "block {} does not link to its predecessor",
                    block.index
                )));
            }
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use v2x_core::GENESIS_VALIDATOR;

    #[test]
    fn test_genesis_block() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.last_block();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.previous_hash, "0000");
        assert_eq!(genesis.validator, GENESIS_VALIDATOR);
        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.hash().unwrap(), genesis.hash().unwrap());
    }

    #[test]
    fn test_end_to_end_three_transactions() {
        let mut ledger = Ledger::new();
        for (s, r, m) in [("A", "B", "m1"), ("B", "C", "m2"), ("C", "A", "m3")] {
            assert_eq!(ledger.submit(s, r, m, "rsu1").unwrap(), 2);
        }
        let genesis_hash = ledger.last_block().hash().unwrap();
        let block = ledger.seal("A").unwrap().clone();

        assert_eq!(ledger.len(), 2);
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis_hash);
        let senders: Vec<&str> = block
            .transactions
            .iter()
            .map(|t| t.sender_vehicle.as_str())
            .collect();
        assert_eq!(senders, vec!["A", "B", "C"]);
        assert!(ledger.pending().is_empty());
        ledger.verify().unwrap();
    }

    #[test]
    fn test_duplicate_rejected_until_sealed() {
        let mut ledger = Ledger::new();
        ledger.submit("A", "B", "ct", "rsu1").unwrap();
        assert!(matches!(
            ledger.submit("A", "C", "ct", "rsu1"),
            Err(V2xError::DuplicateTransaction { .. })
        ));
        // Same ciphertext from another sender is a different key.
        ledger.submit("B", "C", "ct", "rsu1").unwrap();
        ledger.seal("A").unwrap();
        assert_eq!(ledger.submit("A", "B", "ct", "rsu1").unwrap(), 3);
    }

    #[test]
    fn test_empty_seal_still_links() {
        let mut ledger = Ledger::new();
        ledger.seal("A").unwrap();
        ledger.seal_with_proof("B", Some(42)).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.last_block().proof, Some(42));
        ledger.verify().unwrap();
    }

    #[test]
    fn test_lookup_out_of_range() {
        let mut ledger = Ledger::new();
        ledger.submit("A", "B", "ct", "rsu1").unwrap();
        ledger.seal("A").unwrap();
        assert_eq!(ledger.transaction(2, 1).unwrap().v2x_message, "ct");
        assert!(matches!(ledger.block(0), Err(V2xError::IndexOutOfRange(_))));
        assert!(matches!(ledger.block(3), Err(V2xError::IndexOutOfRange(_))));
        assert!(matches!(ledger.transaction(2, 0), Err(V2xError::IndexOutOfRange(_))));
        assert!(matches!(ledger.transaction(2, 2), Err(V2xError::IndexOutOfRange(_))));
        assert!(matches!(ledger.transaction(1, 1), Err(V2xError::IndexOutOfRange(_))));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut ledger = Ledger::new();
        ledger.submit("A", "B", "ct", "rsu1").unwrap();
        ledger.seal("A").unwrap();
        ledger.seal("B").unwrap();
        ledger.chain[1].validator = "mallory".into();
        assert!(matches!(ledger.verify(), Err(V2xError::Validation(_))));
    }
}
