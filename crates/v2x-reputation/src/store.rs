// crates/v2x-reputation/src/store.rs
//
// TrustStore: the owned home of all trust and reputation state.
//
// A recomputation cycle builds a complete `TrustSnapshot` without touching
// the store, then `install` swaps it in and folds the new opinions into the
// per-vehicle reputation histories. Callers hold the store behind a write
// lock for the duration of `install`, so readers either see the previous
// snapshot or the new one, never a partially-built matrix.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use v2x_core::{V2xError, VehicleId};

use crate::history::ReputationRecord;
use crate::trust_matrix::TrustMatrix;
use crate::update::ReputationStrategy;

/// Every matrix and per-vehicle vector derived in one recomputation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustSnapshot {
    /// Cycle number that produced this snapshot (0 = empty initial state).
    pub cycle: u64,
    /// Averaged direct trust, entries[receiver][sender].
    pub direct: TrustMatrix,
    /// Beacons observed per (receiver, sender) pair.
    pub counts: Vec<Vec<u32>>,
    /// Leave-one-out indirect trust.
    pub indirect: TrustMatrix,
    /// Fused comprehensive opinion.
    pub fused: TrustMatrix,
    /// Row means of the fused matrix.
    pub intermediary: Vec<f64>,
    /// Per-vehicle opinion fed to the reputation updater: column means of
    /// the fused matrix, i.e. how trusted each vehicle is by the others.
    pub opinions: Vec<f64>,
}

impl TrustSnapshot {
    /// An all-zero snapshot for a fleet of `size` vehicles.
    pub fn empty(size: usize) -> Self {
        Self {
            cycle: 0,
            direct: TrustMatrix::new(size),
            counts: vec![vec![0; size]; size],
            indirect: TrustMatrix::new(size),
            fused: TrustMatrix::new(size),
            intermediary: vec![0.0; size],
            opinions: vec![0.0; size],
        }
    }

    /// Number of vehicles covered.
    pub fn size(&self) -> usize {
        self.direct.size()
    }
}

/// Reputation histories plus the latest trust snapshot.
#[derive(Debug)]
pub struct TrustStore {
    reputations: Vec<ReputationRecord>,
    snapshot: Arc<TrustSnapshot>,
    cycles: u64,
}

impl TrustStore {
    /// Create a store for `num_vehicles` vehicles, all at the neutral prior.
    pub fn new(num_vehicles: usize) -> Self {
        Self {
            reputations: vec![ReputationRecord::new(); num_vehicles],
            snapshot: Arc::new(TrustSnapshot::empty(num_vehicles)),
            cycles: 0,
        }
    }

    /// Number of vehicles tracked.
    pub fn num_vehicles(&self) -> usize {
        self.reputations.len()
    }

    /// Number of snapshots installed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Reputation history of a vehicle.
    ///
    /// # Errors
    /// Returns `V2xError::UnknownVehicle` if the id is outside the fleet.
    pub fn reputation(&self, vehicle: VehicleId) -> Result<&ReputationRecord, V2xError> {
        let slot = self.slot(vehicle)?;
        Ok(&self.reputations[slot])
    }

    /// Current reputation (history slot 0) of a vehicle.
    pub fn current_reputation(&self, vehicle: VehicleId) -> Result<f64, V2xError> {
        Ok(self.reputation(vehicle)?.current())
    }

    /// Current reputation of every vehicle, indexed by zero-based slot.
    pub fn reputations(&self) -> Vec<f64> {
        self.reputations.iter().map(ReputationRecord::current).collect()
    }

    /// The latest installed snapshot. Cloning the `Arc` is cheap and the
    /// snapshot stays valid after the lock is released.
    pub fn snapshot(&self) -> Arc<TrustSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Push an externally computed reputation value into a vehicle's history.
    pub fn update_reputation(&mut self, vehicle: VehicleId, value: f64) -> Result<(), V2xError> {
        let slot = self.slot(vehicle)?;
        self.reputations[slot].push(value);
        Ok(())
    }

    /// Install a freshly computed snapshot and update every reputation from
    /// its opinions with the given strategy.
    ///
    /// # Errors
    /// Returns `V2xError::Validation` if the snapshot does not cover the
    /// same fleet as the store. The store is left untouched in that case.
    pub fn install(
        &mut self,
        snapshot: TrustSnapshot,
        strategy: &ReputationStrategy,
    ) -> Result<(), V2xError> {
        let offsets = vec![0.0; snapshot.opinions.len()];
        self.install_with_offsets(snapshot, strategy, &offsets)
    }

    /// Like [`install`](Self::install), but adds `offsets[i]` to vehicle i's
    /// new reputation before the strategy's bounds are applied.
    ///
    /// # Errors
    /// Returns `V2xError::Validation` if the snapshot or the offsets do not
    /// cover the same fleet as the store. The store is left untouched.
    pub fn install_with_offsets(
        &mut self,
        snapshot: TrustSnapshot,
        strategy: &ReputationStrategy,
        offsets: &[f64],
    ) -> Result<(), V2xError> {
        let n = self.reputations.len();
        if snapshot.opinions.len() != n || offsets.len() != n {
            return Err(V2xError::Validation(format!(
                "snapshot covers {} vehicles with {} offsets, store tracks {}",
                snapshot.opinions.len(),
                offsets.len(),
                n
            )));
        }
        for ((record, opinion), offset) in self
            .reputations
            .iter_mut()
            .zip(&snapshot.opinions)
            .zip(offsets)
        {
            strategy.apply_with_offset(*opinion, record, *offset);
        }
        self.cycles += 1;
        self.snapshot = Arc::new(snapshot);
        Ok(())
    }

    /// Vehicles whose current reputation meets `threshold`, with that
    /// reputation, in id order.
    pub fn eligible_vehicles(&self, threshold: f64) -> Vec<(VehicleId, f64)> {
        self.reputations
            .iter()
            .enumerate()
            .map(|(i, r)| (VehicleId::from_index(i), r.current()))
            .filter(|(_, rep)| *rep >= threshold)
            .collect()
    }

    fn slot(&self, vehicle: VehicleId) -> Result<usize, V2xError> {
        if vehicle.0 == 0 || usize::from(vehicle.0) > self.reputations.len() {
            return Err(V2xError::UnknownVehicle(vehicle.to_string()));
        }
        Ok(vehicle.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(opinions: Vec<f64>) -> TrustSnapshot {
        let mut snapshot = TrustSnapshot::empty(opinions.len());
        snapshot.cycle = 1;
        snapshot.opinions = opinions;
        snapshot
    }

    #[test]
    fn test_new_store_is_neutral() {
        let store = TrustStore::new(3);
        assert_eq!(store.reputations(), vec![0.5, 0.5, 0.5]);
        assert_eq!(store.snapshot().cycle, 0);
        assert_eq!(store.cycles(), 0);
    }

    #[test]
    fn test_install_updates_reputations_and_swaps_snapshot() {
        let mut store = TrustStore::new(2);
        let before = store.snapshot();
        let strategy = ReputationStrategy::TwoState { gamma: 0.15 };
        store.install(snapshot_with(vec![0.9, 0.1]), &strategy).unwrap();

        // Old readers keep their snapshot.
        assert_eq!(before.cycle, 0);
        assert_eq!(store.snapshot().cycle, 1);
        assert_eq!(store.cycles(), 1);

        let reps = store.reputations();
        assert!((reps[0] - 0.5).abs() < 1e-12);
        assert!((reps[1] - 0.5).abs() < 1e-12);
        let history = store.reputation(VehicleId(1)).unwrap();
        assert_eq!(history.slots().len(), 3);
    }

    #[test]
    fn test_install_rejects_size_mismatch() {
        let mut store = TrustStore::new(2);
        let result = store.install(snapshot_with(vec![0.9]), &ReputationStrategy::default());
        assert!(matches!(result, Err(V2xError::Validation(_))));
        assert_eq!(store.cycles(), 0);
        assert_eq!(store.reputations(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_offsets_move_two_state_off_neutral() {
        let mut store = TrustStore::new(2);
        let strategy = ReputationStrategy::TwoState { gamma: 0.15 };
        let offsets = [0.1, 0.1];
        for _ in 0..2 {
            store
                .install_with_offsets(snapshot_with(vec![0.9, 0.1]), &strategy, &offsets)
                .unwrap();
        }
        // Cycle 1 lifts both to 0.6; from there the opinions pull them apart.
        let reps = store.reputations();
        assert!((reps[0] - 0.656).abs() < 1e-9, "got {}", reps[0]);
        assert!((reps[1] - 0.544).abs() < 1e-9, "got {}", reps[1]);
        assert!(reps[0] > reps[1]);
    }

    #[test]
    fn test_offsets_length_must_match() {
        let mut store = TrustStore::new(2);
        let result = store.install_with_offsets(
            snapshot_with(vec![0.9, 0.1]),
            &ReputationStrategy::default(),
            &[0.1],
        );
        assert!(matches!(result, Err(V2xError::Validation(_))));
        assert_eq!(store.cycles(), 0);
    }

    #[test]
    fn test_eligible_vehicles_threshold() {
        let mut store = TrustStore::new(3);
        store.update_reputation(VehicleId(1), 0.7).unwrap();
        store.update_reputation(VehicleId(2), 0.2).unwrap();
        let eligible = store.eligible_vehicles(0.5);
        assert_eq!(eligible, vec![(VehicleId(1), 0.7), (VehicleId(3), 0.5)]);
    }

    #[test]
    fn test_unknown_vehicle() {
        let store = TrustStore::new(2);
        assert!(matches!(
            store.current_reputation(VehicleId(3)),
            Err(V2xError::UnknownVehicle(_))
        ));
        assert!(store.current_reputation(VehicleId(0)).is_err());
    }
}
