// crates/v2x-core/src/cipher.rs
//
// Payload cipher for V2X transaction messages.
//
// Messages are sealed with ChaCha20-Poly1305 and base64-encoded for the
// ledger. The nonce is derived from the key and the plaintext, so the same
// message always encrypts to the same ciphertext under one key. The pending
// pool relies on that to detect duplicate (sender, ciphertext) submissions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::V2xError;
use crate::traits::PayloadCipher;

const NONCE_LEN: usize = 12;
const SYMMETRIC_KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 implementation of [`PayloadCipher`].
pub struct ChaChaPayloadCipher {
    key: [u8; SYMMETRIC_KEY_LEN],
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for ChaChaPayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaChaPayloadCipher").finish_non_exhaustive()
    }
}

impl ChaChaPayloadCipher {
    /// Create a cipher with a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; SYMMETRIC_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self::from_key(key)
    }

    /// Create a cipher from raw key bytes.
    pub fn from_key(key: [u8; SYMMETRIC_KEY_LEN]) -> Self {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        Self { key, cipher }
    }

    /// Create a cipher from a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> Result<Self, V2xError> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| V2xError::Config(format!("Invalid cipher key hex: {}", e)))?;
        let key: [u8; SYMMETRIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            V2xError::Config(format!("Cipher key must be exactly {} bytes", SYMMETRIC_KEY_LEN))
        })?;
        Ok(Self::from_key(key))
    }

    fn derive_nonce(&self, plaintext: &[u8]) -> [u8; NONCE_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(plaintext);
        let digest = hasher.finalize();
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        nonce
    }
}

impl PayloadCipher for ChaChaPayloadCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, V2xError> {
        let nonce = self.derive_nonce(plaintext.as_bytes());
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| V2xError::Cipher("encryption failed".to_string()))?;

        let mut framed = Vec::with_capacity(NONCE_LEN + sealed.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&sealed);
        Ok(BASE64.encode(framed))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, V2xError> {
        let framed = BASE64
            .decode(ciphertext)
            .map_err(|e| V2xError::Cipher(format!("invalid base64 payload: {}", e)))?;
        if framed.len() < NONCE_LEN {
            return Err(V2xError::Cipher("payload shorter than nonce".to_string()));
        }
        let (nonce, sealed) = framed.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| V2xError::Cipher("decryption failed".to_string()))?;
        String::from_utf8(plain).map_err(|e| V2xError::Cipher(format!("payload is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_various_lengths() {
        let cipher = ChaChaPayloadCipher::generate();
        let long = "x".repeat(1000);
        for message in ["", "hi", "exactly sixteen!", "{\"speed\":50.0}", long.as_str()] {
            let sealed = cipher.encrypt(message).unwrap();
            assert_eq!(cipher.decrypt(&sealed).unwrap(), message);
        }
    }

    #[test]
    fn test_encryption_is_deterministic_per_key() {
        let cipher = ChaChaPayloadCipher::from_key([7u8; 32]);
        assert_eq!(cipher.encrypt("beacon").unwrap(), cipher.encrypt("beacon").unwrap());
        assert_ne!(cipher.encrypt("beacon").unwrap(), cipher.encrypt("beacon2").unwrap());
        assert_ne!(cipher.encrypt("beacon").unwrap(), "beacon");
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = ChaChaPayloadCipher::from_key([1u8; 32]);
        let b = ChaChaPayloadCipher::from_key([2u8; 32]);
        let sealed = a.encrypt("secret").unwrap();
        assert!(b.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_garbage_input_fails() {
        let cipher = ChaChaPayloadCipher::generate();
        assert!(cipher.decrypt("not base64!!").is_err());
        assert!(cipher.decrypt("AAAA").is_err());
    }

    #[test]
    fn test_from_hex() {
        let key = "11".repeat(32);
        assert!(ChaChaPayloadCipher::from_hex(&key).is_ok());
        assert!(ChaChaPayloadCipher::from_hex("abcd").is_err());
        assert!(ChaChaPayloadCipher::from_hex("zz").is_err());
    }
}
