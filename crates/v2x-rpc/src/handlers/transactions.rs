// crates/v2x-rpc/src/handlers/transactions.rs
//
// Transaction handlers: NewTransaction, DecryptTransaction.

use serde::{Deserialize, Serialize};

use v2x_consensus::LedgerService;
use v2x_core::V2xError;

// ---------------------------------------------------------------------------
// NewTransaction
// ---------------------------------------------------------------------------

/// Request to admit a V2X message into the pending pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionRequest {
    pub sender_vehicle: String,
    pub receiver_vehicle: String,
    /// Plaintext message; encrypted before it reaches the ledger.
    pub v2x_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionResponse {
    pub message: String,
    /// Index of the block this transaction will be sealed into.
    pub block_index: u64,
}

/// Handle a NewTransaction request.
pub async fn handle_new_transaction(
    ledger: &LedgerService,
    request: NewTransactionRequest,
) -> Result<NewTransactionResponse, V2xError> {
    let block_index = ledger
        .submit_transaction(
            &request.sender_vehicle,
            &request.receiver_vehicle,
            &request.v2x_message,
        )
        .await?;
    Ok(NewTransactionResponse {
        message: format!("New transaction added to block {}", block_index),
        block_index,
    })
}

// ---------------------------------------------------------------------------
// DecryptTransaction
// ---------------------------------------------------------------------------

/// Request to decrypt a sealed transaction. Both indices are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptTransactionRequest {
    pub block_index: u64,
    pub transaction_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptTransactionResponse {
    pub decrypted_message: String,
}

/// Handle a DecryptTransaction request.
pub async fn handle_decrypt_transaction(
    ledger: &LedgerService,
    request: DecryptTransactionRequest,
) -> Result<DecryptTransactionResponse, V2xError> {
    let decrypted_message = ledger
        .decrypt_transaction(request.block_index, request.transaction_index)
        .await?;
    Ok(DecryptTransactionResponse { decrypted_message })
}
