// crates/v2x-core/src/identity.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a vehicle in the simulated fleet.
///
/// Vehicle ids are 1-based, matching the numbering used in beacon file
/// names (`bsm<sender>_<receiver>.json`). Trust matrices index vehicles
/// by `id - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u16);

impl VehicleId {
    /// Zero-based matrix index for this vehicle.
    pub fn index(&self) -> usize {
        usize::from(self.0).saturating_sub(1)
    }

    /// Build the vehicle id for a zero-based matrix index.
    pub fn from_index(index: usize) -> Self {
        VehicleId((index + 1) as u16)
    }

    /// Identity string used on the ledger and in the validator registry.
    pub fn ledger_name(&self) -> String {
        format!("vehicle_{}", self.0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vehicle_{}", self.0)
    }
}
