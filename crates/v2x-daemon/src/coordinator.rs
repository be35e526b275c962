// crates/v2x-daemon/src/coordinator.rs
//
// Batch coordinator: drives beacons through the ledger and trust pipeline.
//
// Beacons are submitted as transactions in timestamp order. Every
// `batch_size` accepted transactions the coordinator:
//   1. forges a block (select, stake, seal, reward under the ledger lock)
//   2. recomputes trust over every beacon seen so far, off-lock
//   3. installs the snapshot into the trust store under its write lock
//   4. re-registers every vehicle at or above the eligibility threshold
//
// A failed forge (no eligible validator, rejected stake) leaves the pool in
// place; the next cycle tries again. Beacons naming a vehicle outside the
// fleet are skipped before they reach the ledger or the trust pipeline.

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::RwLock;

use v2x_consensus::{ForgeOutcome, LedgerService};
use v2x_core::{Beacon, V2xError, VehicleId};
use v2x_reputation::{TrustEngine, TrustStore};

/// Counters for one coordinator run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorReport {
    /// Transactions accepted into the pending pool.
    pub submitted: usize,
    /// Beacons rejected as duplicate transactions.
    pub duplicates: usize,
    /// Beacons skipped because sender or receiver is outside the fleet.
    pub out_of_fleet: usize,
    /// Completed forging and recomputation cycles.
    pub cycles: usize,
    /// Blocks appended to the chain.
    pub blocks_forged: usize,
    /// Forge attempts that did not produce a block.
    pub forge_failures: usize,
}

/// Feeds beacons into the ledger and triggers periodic recomputation.
pub struct BatchCoordinator {
    ledger: Arc<LedgerService>,
    engine: TrustEngine,
    store: Arc<RwLock<TrustStore>>,
    batch_size: usize,
    eligibility_threshold: f64,
    rng: StdRng,
    seen: Vec<Beacon>,
    in_batch: usize,
    report: CoordinatorReport,
}

impl BatchCoordinator {
    pub fn new(
        ledger: Arc<LedgerService>,
        engine: TrustEngine,
        store: Arc<RwLock<TrustStore>>,
        batch_size: usize,
        eligibility_threshold: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            ledger,
            engine,
            store,
            batch_size: batch_size.max(1),
            eligibility_threshold,
            rng,
            seen: Vec::new(),
            in_batch: 0,
            report: CoordinatorReport::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn report(&self) -> &CoordinatorReport {
        &self.report
    }

    /// Process every beacon in order.
    ///
    /// Transactions left over after the last full batch stay pending.
    pub async fn run(&mut self, beacons: Vec<Beacon>) -> Result<CoordinatorReport, V2xError> {
        for beacon in beacons {
            self.process(beacon).await?;
        }
        if self.in_batch > 0 {
            tracing::info!(
                pending = self.in_batch,
                batch_size = self.batch_size,
                "Beacon stream ended mid-batch, transactions left pending"
            );
        }
        Ok(self.report.clone())
    }

    /// Submit one beacon and complete a cycle when the batch is full.
    pub async fn process(&mut self, beacon: Beacon) -> Result<(), V2xError> {
        let fleet = self.engine.num_vehicles();
        if !in_fleet(beacon.sender, fleet) || !in_fleet(beacon.receiver, fleet) {
            tracing::warn!(
                sender = %beacon.sender,
                receiver = %beacon.receiver,
                num_vehicles = fleet,
                "Beacon outside the fleet skipped"
            );
            self.report.out_of_fleet += 1;
            return Ok(());
        }

        let payload = serde_json::to_string(&beacon.record())?;
        let sender = beacon.sender.ledger_name();
        let receiver = beacon.receiver.ledger_name();
        self.seen.push(beacon);

        match self
            .ledger
            .submit_transaction(&sender, &receiver, &payload)
            .await
        {
            Ok(block_index) => {
                tracing::trace!(%sender, %receiver, block_index, "Beacon submitted");
                self.report.submitted += 1;
                self.in_batch += 1;
            }
            Err(V2xError::DuplicateTransaction { .. }) => {
                self.report.duplicates += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        if self.in_batch >= self.batch_size {
            self.complete_cycle().await?;
        }
        Ok(())
    }

    /// Forge, recompute trust, install, and refresh validators.
    pub async fn complete_cycle(&mut self) -> Result<(), V2xError> {
        match self.ledger.forge().await {
            Ok(ForgeOutcome::Sealed { .. }) => {
                self.report.blocks_forged += 1;
                self.in_batch = 0;
            }
            Ok(ForgeOutcome::StakeRejected { validator }) => {
                tracing::warn!(%validator, "Forge skipped: stake rejected");
                self.report.forge_failures += 1;
            }
            Err(e @ (V2xError::NoEligibleValidator | V2xError::ProofSearchExhausted(_))) => {
                tracing::warn!(error = %e, "Forge failed, retrying next cycle");
                self.report.forge_failures += 1;
            }
            Err(e) => return Err(e),
        }

        // Build the snapshot without holding the trust store lock.
        let cycle = self.store.read().await.cycles() + 1;
        let snapshot = self.engine.compute(&self.seen, cycle, &mut self.rng)?;

        let eligible = {
            let mut store = self.store.write().await;
            self.engine.install(&mut store, snapshot, &mut self.rng)?;
            store.eligible_vehicles(self.eligibility_threshold)
        };

        let entries: Vec<(String, f64)> = eligible
            .iter()
            .map(|(id, reputation)| (id.ledger_name(), *reputation))
            .collect();
        self.ledger.refresh_validators(&entries).await;

        self.report.cycles += 1;
        tracing::info!(
            cycle,
            beacons = self.seen.len(),
            eligible = entries.len(),
            "Trust recomputed"
        );
        Ok(())
    }
}

fn in_fleet(id: VehicleId, num_vehicles: usize) -> bool {
    id.0 >= 1 && usize::from(id.0) <= num_vehicles
}

/// Register every vehicle of the fleet at the neutral opinion.
pub async fn bootstrap_validators(
    ledger: &LedgerService,
    num_vehicles: usize,
) -> Result<(), V2xError> {
    for index in 0..num_vehicles {
        ledger
            .add_validator(&VehicleId::from_index(index).ledger_name(), None)
            .await?;
    }
    tracing::info!(num_vehicles, "Validators bootstrapped at neutral opinion");
    Ok(())
}
