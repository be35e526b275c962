// crates/v2x-cli/src/main.rs
//
// CLI entrypoint for the V2X opinion ledger.
//
// Talks to a running v2x-daemon over JSON-RPC: submit and decrypt
// messages, forge blocks, inspect the chain, manage validators, and read
// the latest reputations.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::transaction::{DecryptCmd, SubmitCmd};
use commands::validator::ValidatorCmd;
use output::OutputFormat;
use rpc_client::RpcClient;

/// V2X ledger CLI.
#[derive(Parser, Debug)]
#[command(
    name = "v2x",
    version = "0.1.0",
    about = "V2X opinion ledger CLI: transactions, forging, validators and reputations"
)]
struct Cli {
    /// RPC endpoint for the v2x-daemon.
    #[arg(long, global = true, default_value = "http://127.0.0.1:50061")]
    rpc: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit a V2X message into the pending pool.
    Submit(SubmitCmd),

    /// Decrypt a sealed transaction.
    Decrypt(DecryptCmd),

    /// Forge the pending pool into a new block.
    Mine,

    /// Display the full chain.
    Chain,

    /// Validator management: add, stake, list.
    #[command(subcommand)]
    Validator(ValidatorCmd),

    /// Display per-vehicle reputations.
    Reputations,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RpcClient::new(cli.rpc.clone());
    let format = cli.output;

    match &cli.command {
        Commands::Submit(cmd) => commands::transaction::submit(&client, cmd, format).await?,
        Commands::Decrypt(cmd) => commands::transaction::decrypt(&client, cmd, format).await?,
        Commands::Mine => commands::mine::run(&client, format).await?,
        Commands::Chain => commands::chain::run(&client, format).await?,
        Commands::Validator(cmd) => commands::validator::run(&client, cmd, format).await?,
        Commands::Reputations => commands::reputations::run(&client, format).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validator_stake() {
        let cli = Cli::try_parse_from([
            "v2x", "validator", "stake", "--id", "vehicle_2", "--amount", "0.1",
        ])
        .unwrap();
        match cli.command {
            Commands::Validator(ValidatorCmd::Stake { id, amount }) => {
                assert_eq!(id, "vehicle_2");
                assert_eq!(amount, 0.1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.rpc, "http://127.0.0.1:50061");
        assert_eq!(cli.output, OutputFormat::Table);
    }

    #[test]
    fn parses_global_output_after_subcommand() {
        let cli = Cli::try_parse_from(["v2x", "chain", "--output", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::Chain));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn submit_requires_all_fields() {
        assert!(Cli::try_parse_from(["v2x", "submit", "--sender", "vehicle_1"]).is_err());
    }
}
