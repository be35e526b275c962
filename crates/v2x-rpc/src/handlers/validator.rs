// crates/v2x-rpc/src/handlers/validator.rs
//
// Validator handlers: AddValidator, StakeValidator, ListValidators.

use serde::{Deserialize, Serialize};

use v2x_consensus::{LedgerService, Validator};
use v2x_core::V2xError;

// ---------------------------------------------------------------------------
// AddValidator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddValidatorRequest {
    pub validator_id: String,
    /// Initial opinion. Defaults to the neutral 0.5.
    #[serde(default)]
    pub opinion: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddValidatorResponse {
    pub message: String,
}

/// Handle an AddValidator request.
pub async fn handle_add_validator(
    ledger: &LedgerService,
    request: AddValidatorRequest,
) -> Result<AddValidatorResponse, V2xError> {
    ledger
        .add_validator(&request.validator_id, request.opinion)
        .await?;
    Ok(AddValidatorResponse {
        message: format!(
            "Validator {} added with initial opinion value",
            request.validator_id
        ),
    })
}

// ---------------------------------------------------------------------------
// StakeValidator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeValidatorRequest {
    pub validator_id: String,
    pub stake_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeValidatorResponse {
    pub message: String,
    /// Opinion actually staked; 0 when the validator could not cover it.
    pub staked: f64,
}

/// Handle a StakeValidator request.
pub async fn handle_stake_validator(
    ledger: &LedgerService,
    request: StakeValidatorRequest,
) -> Result<StakeValidatorResponse, V2xError> {
    let staked = ledger
        .stake_validator(&request.validator_id, request.stake_value)
        .await?;
    let message = if staked > 0.0 {
        format!(
            "Validator {} staked {} opinion points",
            request.validator_id, request.stake_value
        )
    } else {
        format!(
            "Validator {} does not have enough opinion to stake",
            request.validator_id
        )
    };
    Ok(StakeValidatorResponse { message, staked })
}

// ---------------------------------------------------------------------------
// ListValidators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListValidatorsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListValidatorsResponse {
    pub validators: Vec<Validator>,
    pub total_opinion: f64,
}

/// Handle a ListValidators request.
pub async fn handle_list_validators(
    ledger: &LedgerService,
    _request: ListValidatorsRequest,
) -> Result<ListValidatorsResponse, V2xError> {
    let validators = ledger.validators().await;
    let total_opinion = validators.iter().map(|v| v.opinion.max(0.0)).sum();
    Ok(ListValidatorsResponse {
        validators,
        total_opinion,
    })
}
