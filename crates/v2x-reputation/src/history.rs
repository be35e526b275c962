// crates/v2x-reputation/src/history.rs
//
// Fixed-depth reputation history for a single vehicle.

use serde::{Deserialize, Serialize};

/// Number of past reputation values retained per vehicle.
pub const HISTORY_DEPTH: usize = 3;

/// Neutral prior every vehicle starts from.
pub const NEUTRAL_REPUTATION: f64 = 0.5;

/// Most-recent-first reputation history.
///
/// Slot 0 always holds the current reputation. Pushing a value shifts the
/// older ones right and discards the oldest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationRecord {
    slots: [f64; HISTORY_DEPTH],
}

impl ReputationRecord {
    /// A record holding the neutral prior in every slot.
    pub fn new() -> Self {
        Self {
            slots: [NEUTRAL_REPUTATION; HISTORY_DEPTH],
        }
    }

    /// The current reputation (slot 0).
    pub fn current(&self) -> f64 {
        self.slots[0]
    }

    /// All slots, most recent first.
    pub fn slots(&self) -> &[f64; HISTORY_DEPTH] {
        &self.slots
    }

    /// Record a new reputation value.
    pub fn push(&mut self, value: f64) {
        self.slots.rotate_right(1);
        self.slots[0] = value;
    }
}

impl Default for ReputationRecord {
    fn default() -> Self {
        Self::new()
    }
}
