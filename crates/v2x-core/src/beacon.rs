// crates/v2x-core/src/beacon.rs
//
// Beacons: the periodic status broadcasts (basic safety messages) that
// vehicles emit and the roadside unit observes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::VehicleId;

/// GPS position carried by a beacon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// The on-disk body of a beacon file.
///
/// Sender and receiver are not part of the body; they are encoded in the
/// file name. Field names follow the camelCase wire format of the
/// recorded traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconRecord {
    /// Broadcast time, e.g. "2024-03-01T12:00:05Z".
    pub timestamp: DateTime<Utc>,
    /// Vehicle speed.
    pub speed: f64,
    /// Received signal power at the observer. Older traces omit it.
    #[serde(default)]
    pub received_power: f64,
    /// Heading in degrees.
    #[serde(default)]
    pub heading: f64,
    /// Reported position.
    pub position: Position,
}

/// A single observed beacon from `sender` as received by `receiver`.
///
/// Immutable once read. The source of truth is external storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub sender: VehicleId,
    pub receiver: VehicleId,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub received_power: f64,
    pub heading: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Beacon {
    /// Build a beacon from a stored record and the pair encoded in its file name.
    pub fn from_record(sender: VehicleId, receiver: VehicleId, record: BeaconRecord) -> Self {
        Self {
            sender,
            receiver,
            timestamp: record.timestamp,
            speed: record.speed,
            received_power: record.received_power,
            heading: record.heading,
            latitude: record.position.latitude,
            longitude: record.position.longitude,
        }
    }

    /// The record form of this beacon, used as the transaction payload.
    pub fn record(&self) -> BeaconRecord {
        BeaconRecord {
            timestamp: self.timestamp,
            speed: self.speed,
            received_power: self.received_power,
            heading: self.heading,
            position: Position {
                latitude: self.latitude,
                longitude: self.longitude,
            },
        }
    }
}
