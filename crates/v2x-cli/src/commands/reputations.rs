// crates/v2x-cli/src/commands/reputations.rs
//
// `v2x reputations`: per-vehicle reputation, history and latest opinion.

use tabled::Tabled;

use v2x_rpc::handlers::trust::{GetReputationsRequest, GetReputationsResponse};

use crate::output::{format_json, format_score, format_table, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

#[derive(Tabled)]
struct ReputationRow {
    #[tabled(rename = "Vehicle")]
    vehicle: String,
    #[tabled(rename = "Reputation")]
    reputation: String,
    #[tabled(rename = "History")]
    history: String,
    #[tabled(rename = "Opinion")]
    opinion: String,
}

pub async fn run(client: &RpcClient, format: OutputFormat) -> Result<(), CliError> {
    let response: GetReputationsResponse = client
        .call("trust/reputations", &GetReputationsRequest {})
        .await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&response));
        return Ok(());
    }

    println!("Trust cycles completed: {}", response.cycle);
    println!();
    let rows: Vec<ReputationRow> = response
        .vehicles
        .iter()
        .map(|v| ReputationRow {
            vehicle: v.vehicle.clone(),
            reputation: format_score(v.reputation),
            history: v
                .history
                .iter()
                .map(|h| format!("{:.3}", h))
                .collect::<Vec<_>>()
                .join(" "),
            opinion: format_score(v.opinion),
        })
        .collect();
    println!("{}", format_table(&rows));
    Ok(())
}
