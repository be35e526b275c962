// crates/v2x-daemon/src/config.rs
//
// Runtime configuration for the V2X ledger daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use v2x_consensus::LedgerConfig;
use v2x_core::V2xError;
use v2x_reputation::{ScorerConfig, TrustConfig};

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level used when `RUST_LOG` is unset: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Identity of the roadside unit admitting transactions.
    #[serde(default = "default_rsu_id")]
    pub rsu_id: String,

    /// Directory holding `bsm<sender>_<receiver>.json` beacon files.
    #[serde(default = "default_beacon_dir")]
    pub beacon_dir: String,

    /// Fleet size. Vehicle ids run from 1 to `num_vehicles`.
    #[serde(default = "default_num_vehicles")]
    pub num_vehicles: usize,

    /// Transactions per forging and recomputation cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Minimum reputation for a vehicle to be (re)registered as validator.
    #[serde(default = "default_eligibility_threshold")]
    pub eligibility_threshold: f64,

    /// Register every vehicle at the neutral opinion on startup.
    #[serde(default = "default_bootstrap_validators")]
    pub bootstrap_validators: bool,

    /// Seed for every random source. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub scorer: ScorerConfig,

    #[serde(default)]
    pub trust: TrustConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50061
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rsu_id() -> String {
    "rsu1".to_string()
}

fn default_beacon_dir() -> String {
    "~/.v2x/beacons".to_string()
}

fn default_num_vehicles() -> usize {
    10
}

fn default_batch_size() -> usize {
    100
}

fn default_eligibility_threshold() -> f64 {
    0.5
}

fn default_bootstrap_validators() -> bool {
    true
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            rsu_id: default_rsu_id(),
            beacon_dir: default_beacon_dir(),
            num_vehicles: default_num_vehicles(),
            batch_size: default_batch_size(),
            eligibility_threshold: default_eligibility_threshold(),
            bootstrap_validators: default_bootstrap_validators(),
            seed: None,
            scorer: ScorerConfig::default(),
            trust: TrustConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), V2xError> {
        if self.num_vehicles == 0 || self.num_vehicles > usize::from(u16::MAX) {
            return Err(V2xError::Config(format!(
                "num_vehicles must be within 1..={}, got {}",
                u16::MAX,
                self.num_vehicles
            )));
        }
        if self.batch_size == 0 {
            return Err(V2xError::Config("batch_size must be positive".into()));
        }
        if !self.eligibility_threshold.is_finite() {
            return Err(V2xError::Config("eligibility_threshold must be finite".into()));
        }
        self.trust.validate()
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
