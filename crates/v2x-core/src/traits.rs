// crates/v2x-core/src/traits.rs

use async_trait::async_trait;

use crate::beacon::Beacon;
use crate::error::V2xError;

/// Reversible confidentiality transform for transaction payloads.
///
/// Implemented by [`crate::cipher::ChaChaPayloadCipher`].
pub trait PayloadCipher: Send + Sync {
    /// Encrypt a plaintext message into a ledger-safe string.
    fn encrypt(&self, plaintext: &str) -> Result<String, V2xError>;

    /// Recover the plaintext from a string produced by `encrypt`.
    fn decrypt(&self, ciphertext: &str) -> Result<String, V2xError>;
}

/// Trait for beacon storage backends.
///
/// Implemented by the daemon's beacon directory loader.
#[async_trait]
pub trait BeaconSource: Send + Sync {
    /// Load every available beacon, sorted by timestamp (oldest first).
    async fn load_beacons(&self) -> Result<Vec<Beacon>, V2xError>;
}
