// crates/v2x-rpc/src/handlers/trust.rs
//
// Trust handlers: GetReputations.
// Reads the latest installed snapshot; never blocks recomputation for longer
// than a read-lock acquisition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use v2x_core::{V2xError, VehicleId};
use v2x_reputation::TrustStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetReputationsRequest {}

/// Reputation state of one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleReputation {
    pub vehicle: String,
    /// Current reputation (history slot 0).
    pub reputation: f64,
    /// Most-recent-first history.
    pub history: Vec<f64>,
    /// Opinion fed into the latest update.
    pub opinion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetReputationsResponse {
    /// Recomputation cycles completed so far.
    pub cycle: u64,
    pub vehicles: Vec<VehicleReputation>,
}

/// Handle a GetReputations request.
pub async fn handle_get_reputations(
    store: &Arc<RwLock<TrustStore>>,
    _request: GetReputationsRequest,
) -> Result<GetReputationsResponse, V2xError> {
    let store = store.read().await;
    let snapshot = store.snapshot();
    let mut vehicles = Vec::with_capacity(store.num_vehicles());
    for slot in 0..store.num_vehicles() {
        let id = VehicleId::from_index(slot);
        let record = store.reputation(id)?;
        vehicles.push(VehicleReputation {
            vehicle: id.ledger_name(),
            reputation: record.current(),
            history: record.slots().to_vec(),
            opinion: snapshot.opinions.get(slot).copied().unwrap_or(0.0),
        });
    }
    Ok(GetReputationsResponse {
        cycle: store.cycles(),
        vehicles,
    })
}
