// crates/v2x-cli/src/commands/mine.rs
//
// `v2x mine`: ask the daemon to forge the pending pool into a block.

use v2x_rpc::handlers::mining::{MineRequest, MineResponse};

use crate::output::{format_json, short_hash, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

pub async fn run(client: &RpcClient, format: OutputFormat) -> Result<(), CliError> {
    let response: MineResponse = client.call("mine", &MineRequest {}).await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&response));
        return Ok(());
    }

    println!("{}", response.message);
    if let Some(block) = &response.block {
        println!("  Index:         {}", block.index);
        println!("  Validator:     {}", block.validator);
        println!("  Transactions:  {}", block.transactions.len());
        println!("  Previous hash: {}", short_hash(&block.previous_hash));
        if let Some(proof) = block.proof {
            println!("  Proof:         {}", proof);
        }
    }
    Ok(())
}
