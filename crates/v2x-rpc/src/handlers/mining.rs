// crates/v2x-rpc/src/handlers/mining.rs
//
// Mining handler: forge the next block from the pending pool.

use serde::{Deserialize, Serialize};

use v2x_consensus::{ForgeOutcome, LedgerService};
use v2x_core::{Block, V2xError};

/// Request to forge a block. Carries no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MineRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineResponse {
    /// Whether a block was appended.
    pub forged: bool,
    pub message: String,
    /// The sealed block, when one was forged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

/// Handle a Mine request.
///
/// A rejected stake is a normal outcome (`forged: false`), not an error.
pub async fn handle_mine(
    ledger: &LedgerService,
    _request: MineRequest,
) -> Result<MineResponse, V2xError> {
    let response = match ledger.forge().await? {
        ForgeOutcome::Sealed { block } => MineResponse {
            forged: true,
            message: format!("Block successfully forged by validator {}", block.validator),
            block: Some(block),
        },
        ForgeOutcome::StakeRejected { validator } => MineResponse {
            forged: false,
            message: format!(
                "Validator {} does not have enough opinion to stake, block not forged",
                validator
            ),
            block: None,
        },
    };
    Ok(response)
}
