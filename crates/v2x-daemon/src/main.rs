// crates/v2x-daemon/src/main.rs
//
// Binary entrypoint for the V2X ledger daemon.
//
// Loads configuration, initializes tracing, builds the ledger service and
// trust engine, starts the RPC server, then replays the beacon directory
// through the batch coordinator. The RPC server keeps serving until Ctrl-C.

mod beacons;
mod config;
mod coordinator;
mod shared;

use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use beacons::BeaconDirectory;
use config::{expand_tilde, DaemonConfig};
use coordinator::{bootstrap_validators, BatchCoordinator};
use shared::DaemonSharedState;

use v2x_consensus::LedgerService;
use v2x_core::{BeaconSource, ChaChaPayloadCipher, PayloadCipher};
use v2x_reputation::{TrustEngine, TrustScorer};
use v2x_rpc::{RpcConfig, V2xRpcServer};

/// V2X ledger daemon: trust-weighted opinion ledger for V2X safety messages.
#[derive(Parser, Debug)]
#[command(name = "v2x-daemon", version = "0.1.0", about = "V2X opinion ledger daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.v2x/config.toml")]
    config: String,

    /// Beacon directory (overrides the config file).
    #[arg(long)]
    beacon_dir: Option<String>,

    /// RPC port (overrides the config file).
    #[arg(long)]
    rpc_port: Option<u16>,

    /// Exit after the beacon directory has been processed instead of
    /// serving RPC until interrupted.
    #[arg(long)]
    exit_when_done: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration is read before tracing starts so its log level can be
    // used; the outcome is logged once the subscriber is up.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    // CLI flags override the config file values.
    if let Some(dir) = args.beacon_dir {
        daemon_config.beacon_dir = dir;
    }
    if let Some(port) = args.rpc_port {
        daemon_config.rpc_port = port;
    }
    daemon_config.validate()?;

    tracing::info!("V2X Ledger Daemon v0.1.0");
    tracing::info!("RSU: {}", daemon_config.rsu_id);
    tracing::info!("Vehicles: {}", daemon_config.num_vehicles);
    tracing::info!("Batch size: {}", daemon_config.batch_size);
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );

    // ---------------------------------------------------------------
    // Random sources. A configured seed makes whole runs reproducible.
    // ---------------------------------------------------------------
    let (ledger_rng, trust_rng) = match daemon_config.seed {
        Some(seed) => {
            tracing::info!("Using seeded random sources (seed={})", seed);
            (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            )
        }
        None => (StdRng::from_entropy(), StdRng::from_entropy()),
    };

    // ---------------------------------------------------------------
    // Ledger service and trust engine.
    // ---------------------------------------------------------------
    let cipher: Arc<dyn PayloadCipher> = match &daemon_config.ledger.cipher_key {
        Some(hex_key) => Arc::new(ChaChaPayloadCipher::from_hex(hex_key)?),
        None => {
            tracing::warn!(
                "No cipher_key configured; using a random key. \
                 Payloads will not be decryptable after restart."
            );
            Arc::new(ChaChaPayloadCipher::generate())
        }
    };

    let ledger = LedgerService::new(
        &daemon_config.ledger,
        cipher,
        daemon_config.rsu_id.clone(),
        ledger_rng,
    )?;
    tracing::info!("Consensus: {}", ledger.consensus_type());

    let engine = TrustEngine::new(
        TrustScorer::new(daemon_config.scorer.clone())?,
        daemon_config.trust.clone(),
        daemon_config.num_vehicles,
    )?;
    tracing::info!(
        "Trust pipeline: fusion={}, reputation={}",
        engine.config().fusion.name(),
        engine.config().reputation.name()
    );

    let shared_state = DaemonSharedState::new(ledger, daemon_config.num_vehicles);

    if daemon_config.bootstrap_validators {
        bootstrap_validators(&shared_state.ledger, daemon_config.num_vehicles).await?;
    }

    // ---------------------------------------------------------------
    // RPC server in the background.
    // ---------------------------------------------------------------
    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let rpc_server = V2xRpcServer::new(rpc_config, shared_state.ledger.clone())
        .with_trust_store(shared_state.trust_store.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let rpc_handle = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = rpc_server.start(shutdown).await {
            tracing::error!("RPC server error: {}", e);
        }
    });

    // ---------------------------------------------------------------
    // Replay the beacon directory through the coordinator.
    // ---------------------------------------------------------------
    let source = BeaconDirectory::new(expand_tilde(&daemon_config.beacon_dir));
    match source.load_beacons().await {
        Ok(beacons) => {
            let mut coordinator = BatchCoordinator::new(
                shared_state.ledger.clone(),
                engine,
                shared_state.trust_store.clone(),
                daemon_config.batch_size,
                daemon_config.eligibility_threshold,
                trust_rng,
            );
            match coordinator.run(beacons).await {
                Ok(report) => tracing::info!(
                    submitted = report.submitted,
                    duplicates = report.duplicates,
                    out_of_fleet = report.out_of_fleet,
                    cycles = report.cycles,
                    blocks = report.blocks_forged,
                    forge_failures = report.forge_failures,
                    "Beacon replay complete"
                ),
                Err(e) => tracing::error!("Beacon replay aborted: {}", e),
            }
        }
        Err(e) => tracing::warn!(
            "Could not load beacons from {}: {}",
            source.path().display(),
            e
        ),
    }

    if !args.exit_when_done {
        tracing::info!("Serving RPC until interrupted (Ctrl-C)");
        tokio::signal::ctrl_c().await?;
    }

    let _ = shutdown_tx.send(());
    let _ = rpc_handle.await;
    tracing::info!(
        uptime_secs = shared_state.start_time.elapsed().as_secs(),
        "V2X daemon shut down gracefully"
    );

    Ok(())
}
