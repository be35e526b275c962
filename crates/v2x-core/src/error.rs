// crates/v2x-core/src/error.rs

use thiserror::Error;

/// Protocol-wide error types for the V2X opinion ledger.
#[derive(Debug, Error)]
pub enum V2xError {
    /// Missing or malformed request fields.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A transaction with the same (sender, ciphertext) pair is already pending.
    #[error("Duplicate transaction detected from {sender}")]
    DuplicateTransaction { sender: String },

    /// Validator selection found no opinion mass to draw from.
    #[error("No validators with positive opinion available")]
    NoEligibleValidator,

    /// A 1-based block or transaction index fell outside the chain.
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    /// Staking or rewarding an identity the registry has never seen.
    #[error("Validator not found in network: {0}")]
    UnknownValidator(String),

    /// A deviation-ratio parameter was configured with a zero average.
    #[error("Undefined average for parameter '{0}': average must be non-zero")]
    UndefinedAverageParameter(String),

    /// A beacon referenced a vehicle outside the configured roster.
    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),

    /// Proof-of-work search ran out of its attempt budget.
    #[error("Proof search exhausted after {0} attempts")]
    ProofSearchExhausted(u64),

    /// Payload encryption or decryption failed.
    #[error("Cipher error: {0}")]
    Cipher(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Beacon storage could not be read.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),
}

impl V2xError {
    /// Short machine-readable label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            V2xError::Validation(_) => "validation",
            V2xError::DuplicateTransaction { .. } => "duplicate_transaction",
            V2xError::NoEligibleValidator => "no_eligible_validator",
            V2xError::IndexOutOfRange(_) => "index_out_of_range",
            V2xError::UnknownValidator(_) => "unknown_validator",
            V2xError::UndefinedAverageParameter(_) => "undefined_average_parameter",
            V2xError::UnknownVehicle(_) => "unknown_vehicle",
            V2xError::ProofSearchExhausted(_) => "proof_search_exhausted",
            V2xError::Cipher(_) => "cipher",
            V2xError::Serialization(_) => "serialization",
            V2xError::Storage(_) => "storage",
            V2xError::Config(_) => "config",
        }
    }

    /// Whether the error was caused by the caller's input rather than the node.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            V2xError::Validation(_)
                | V2xError::DuplicateTransaction { .. }
                | V2xError::IndexOutOfRange(_)
                | V2xError::UnknownValidator(_)
                | V2xError::UnknownVehicle(_)
        )
    }
}

impl From<serde_json::Error> for V2xError {
    fn from(e: serde_json::Error) -> Self {
        V2xError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_flagged() {
        assert!(V2xError::DuplicateTransaction { sender: "vehicle_1".into() }.is_client_error());
        assert!(V2xError::IndexOutOfRange("block 9".into()).is_client_error());
        assert!(!V2xError::NoEligibleValidator.is_client_error());
        assert!(!V2xError::UndefinedAverageParameter("speed".into()).is_client_error());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(V2xError::NoEligibleValidator.kind(), "no_eligible_validator");
        assert_eq!(V2xError::UnknownValidator("x".into()).kind(), "unknown_validator");
    }
}
