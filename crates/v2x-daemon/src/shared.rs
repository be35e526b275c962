// crates/v2x-daemon/src/shared.rs
//
// DaemonSharedState: centralized shared state for the V2X ledger daemon.
//
// Constructed once in main.rs, then handed to the batch coordinator and the
// RPC server.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use v2x_consensus::LedgerService;
use v2x_reputation::TrustStore;

/// Shared state for the daemon, wrapped in Arcs for safe concurrent access
/// from multiple tokio tasks.
#[derive(Clone)]
pub struct DaemonSharedState {
    /// Ledger, validator registry, and selection RNG behind one lock.
    pub ledger: Arc<LedgerService>,
    /// Reputation histories plus the latest trust snapshot.
    pub trust_store: Arc<RwLock<TrustStore>>,
    /// Daemon start time for uptime reporting.
    pub start_time: Instant,
}

impl DaemonSharedState {
    /// Create shared state for a fleet of `num_vehicles`, all at the neutral
    /// reputation.
    pub fn new(ledger: LedgerService, num_vehicles: usize) -> Self {
        Self {
            ledger: Arc::new(ledger),
            trust_store: Arc::new(RwLock::new(TrustStore::new(num_vehicles))),
            start_time: Instant::now(),
        }
    }
}
