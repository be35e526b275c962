// crates/v2x-cli/src/commands/validator.rs
//
// `v2x validator {add, stake, list}`: validator registry management.

use clap::Subcommand;
use tabled::Tabled;

use v2x_rpc::handlers::validator::{
    AddValidatorRequest, AddValidatorResponse, ListValidatorsRequest, ListValidatorsResponse,
    StakeValidatorRequest, StakeValidatorResponse,
};

use crate::output::{format_json, format_score, format_table, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

/// Validator subcommands.
#[derive(Debug, Subcommand)]
pub enum ValidatorCmd {
    /// Register a validator, or reset an existing one's opinion.
    Add {
        /// Ledger identity, e.g. `vehicle_3`.
        #[arg(long)]
        id: String,
        /// Initial opinion (defaults to 0.5 on the daemon).
        #[arg(long)]
        opinion: Option<f64>,
    },
    /// Delegate part of a validator's opinion as stake.
    Stake {
        #[arg(long)]
        id: String,
        #[arg(long)]
        amount: f64,
    },
    /// List registered validators and their opinions.
    List,
}

/// A row in the validator display table.
#[derive(Tabled)]
struct ValidatorRow {
    #[tabled(rename = "Validator")]
    id: String,
    #[tabled(rename = "Opinion")]
    opinion: String,
    #[tabled(rename = "Share")]
    share: String,
}

fn rows(response: &ListValidatorsResponse) -> Vec<ValidatorRow> {
    response
        .validators
        .iter()
        .map(|v| {
            let share = if response.total_opinion > 0.0 {
                format!("{:.1}%", 100.0 * v.opinion.max(0.0) / response.total_opinion)
            } else {
                "--".to_string()
            };
            ValidatorRow {
                id: v.id.clone(),
                opinion: format_score(v.opinion),
                share,
            }
        })
        .collect()
}

pub async fn run(
    client: &RpcClient,
    cmd: &ValidatorCmd,
    format: OutputFormat,
) -> Result<(), CliError> {
    match cmd {
        ValidatorCmd::Add { id, opinion } => {
            let request = AddValidatorRequest {
                validator_id: id.clone(),
                opinion: *opinion,
            };
            let response: AddValidatorResponse = client.call("validator/add", &request).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&response)),
                OutputFormat::Table => println!("{}", response.message),
            }
        }
        ValidatorCmd::Stake { id, amount } => {
            let request = StakeValidatorRequest {
                validator_id: id.clone(),
                stake_value: *amount,
            };
            let response: StakeValidatorResponse =
                client.call("validator/stake", &request).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&response)),
                OutputFormat::Table => println!("{}", response.message),
            }
        }
        ValidatorCmd::List => {
            let response: ListValidatorsResponse = client
                .call("validator/list", &ListValidatorsRequest {})
                .await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&response)),
                OutputFormat::Table => {
                    println!(
                        "Validators: {}  |  Total opinion: {}",
                        response.validators.len(),
                        format_score(response.total_opinion)
                    );
                    println!();
                    println!("{}", format_table(&rows(&response)));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use v2x_consensus::Validator;

    #[test]
    fn share_is_proportional_to_opinion() {
        let response = ListValidatorsResponse {
            validators: vec![
                Validator {
                    id: "vehicle_1".to_string(),
                    opinion: 0.3,
                },
                Validator {
                    id: "vehicle_2".to_string(),
                    opinion: 0.1,
                },
            ],
            total_opinion: 0.4,
        };
        let rows = rows(&response);
        assert_eq!(rows[0].share, "75.0%");
        assert_eq!(rows[1].share, "25.0%");
        assert_eq!(rows[1].opinion, "0.1000");
    }

    #[test]
    fn zero_total_has_no_share() {
        let response = ListValidatorsResponse {
            validators: vec![Validator {
                id: "vehicle_1".to_string(),
                opinion: 0.0,
            }],
            total_opinion: 0.0,
        };
        assert_eq!(rows(&response)[0].share, "--");
    }
}
