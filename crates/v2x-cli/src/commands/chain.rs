// crates/v2x-cli/src/commands/chain.rs
//
// `v2x chain`: print the full chain as a block summary table.

use tabled::Tabled;

use v2x_consensus::ChainView;
use v2x_core::Block;
use v2x_rpc::handlers::chain::GetChainRequest;

use crate::output::{format_json, format_table, short_hash, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

/// A row in the chain display table.
#[derive(Tabled)]
struct BlockRow {
    #[tabled(rename = "Index")]
    index: u64,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Validator")]
    validator: String,
    #[tabled(rename = "Txs")]
    transactions: usize,
    #[tabled(rename = "Previous")]
    previous_hash: String,
    #[tabled(rename = "Proof")]
    proof: String,
}

impl From<&Block> for BlockRow {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.timestamp.to_rfc3339(),
            validator: block.validator.clone(),
            transactions: block.transactions.len(),
            previous_hash: short_hash(&block.previous_hash),
            proof: block
                .proof
                .map(|p| p.to_string())
                .unwrap_or_else(|| "--".to_string()),
        }
    }
}

pub async fn run(client: &RpcClient, format: OutputFormat) -> Result<(), CliError> {
    let view: ChainView = client.call("chain", &GetChainRequest {}).await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&view));
        return Ok(());
    }

    println!("Consensus: {}  |  Length: {}", view.consensus_type, view.length);
    println!();
    let rows: Vec<BlockRow> = view.chain.iter().map(BlockRow::from).collect();
    println!("{}", format_table(&rows));
    Ok(())
}
