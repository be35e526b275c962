// crates/v2x-rpc/src/handlers/chain.rs
//
// Chain handler: return the full chain with its consensus type.

use serde::{Deserialize, Serialize};

use v2x_consensus::{ChainView, LedgerService};
use v2x_core::V2xError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetChainRequest {}

/// Handle a GetChain request.
pub async fn handle_get_chain(
    ledger: &LedgerService,
    _request: GetChainRequest,
) -> Result<ChainView, V2xError> {
    Ok(ledger.chain().await)
}
