// crates/v2x-core/src/lib.rs
//
// v2x-core: Core types, errors, hashing, and the payload cipher for the
// V2X opinion ledger.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines beacons (the basic safety messages vehicles broadcast), ledger
// transactions and blocks, the protocol-wide error type, canonical hashing,
// and the trait interfaces implemented elsewhere in the workspace.

pub mod beacon;
pub mod block;
pub mod cipher;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use v2x_core::Block;`

// Beacon types
pub use beacon::{Beacon, BeaconRecord, Position};

// Ledger types
pub use block::{Block, Transaction, GENESIS_PREVIOUS_HASH, GENESIS_VALIDATOR};

// Identity types
pub use identity::VehicleId;

// Cipher
pub use cipher::ChaChaPayloadCipher;

// Error type
pub use error::V2xError;

// Traits
pub use traits::{BeaconSource, PayloadCipher};
