// crates/v2x-cli/src/commands/transaction.rs
//
// `v2x submit` and `v2x decrypt`: admit a message and read one back.

use clap::Args;

use v2x_rpc::handlers::transactions::{
    DecryptTransactionRequest, DecryptTransactionResponse, NewTransactionRequest,
    NewTransactionResponse,
};

use crate::output::{format_json, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

/// Submit a V2X message into the pending pool.
#[derive(Debug, Args)]
pub struct SubmitCmd {
    /// Sending vehicle, e.g. `vehicle_1`.
    #[arg(long)]
    pub sender: String,
    /// Receiving vehicle, e.g. `vehicle_2`.
    #[arg(long)]
    pub receiver: String,
    /// Plaintext payload; the daemon encrypts it before storing.
    #[arg(long)]
    pub message: String,
}

/// Decrypt a sealed transaction.
#[derive(Debug, Args)]
pub struct DecryptCmd {
    /// 1-based block index.
    #[arg(long)]
    pub block: u64,
    /// 1-based transaction index within the block.
    #[arg(long)]
    pub tx: u64,
}

pub async fn submit(
    client: &RpcClient,
    cmd: &SubmitCmd,
    format: OutputFormat,
) -> Result<(), CliError> {
    let request = NewTransactionRequest {
        sender_vehicle: cmd.sender.clone(),
        receiver_vehicle: cmd.receiver.clone(),
        v2x_message: cmd.message.clone(),
    };
    let response: NewTransactionResponse = client.call("transactions/new", &request).await?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&response)),
        OutputFormat::Table => println!("{}", response.message),
    }
    Ok(())
}

pub async fn decrypt(
    client: &RpcClient,
    cmd: &DecryptCmd,
    format: OutputFormat,
) -> Result<(), CliError> {
    let request = DecryptTransactionRequest {
        block_index: cmd.block,
        transaction_index: cmd.tx,
    };
    let response: DecryptTransactionResponse =
        client.call("transactions/decrypt", &request).await?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&response)),
        OutputFormat::Table => println!("{}", response.decrypted_message),
    }
    Ok(())
}
