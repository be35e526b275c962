// crates/v2x-consensus/src/lib.rs
//
// v2x-consensus: Validator registry, forger selection, and the append-only
// ledger for the V2X opinion ledger.
//
// Reputation computed upstream becomes validator opinion here. Opinion is
// both the weight used to pick the next forger and the balance a forger
// stakes before sealing a block of pending transactions.

pub mod ledger;
pub mod service;
pub mod strategy;
pub mod validators;

pub use ledger::Ledger;
pub use service::{ChainView, ForgeOutcome, LedgerConfig, LedgerService};
pub use strategy::{ConsensusKind, ConsensusStrategy, ForgerSelection, DEFAULT_MAX_ATTEMPTS};
pub use validators::{Validator, ValidatorRegistry, DEFAULT_OPINION};
