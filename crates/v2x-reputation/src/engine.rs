// crates/v2x-reputation/src/engine.rs
//
// TrustEngine: the full recomputation pipeline.
//
// beacons -> scorer -> direct matrix (+ precision noise) -> indirect matrix
// -> fusion -> per-vehicle opinions -> reputation update.
//
// `compute` is pure with respect to the store, so the daemon can run it
// without holding any lock and install the result afterwards.

use rand::Rng;
use serde::{Deserialize, Serialize};

use v2x_core::{Beacon, V2xError};

use crate::fusion::{intermediary_opinion, received_opinion, FusionStrategy};
use crate::noise::PrecisionNoise;
use crate::scoring::TrustScorer;
use crate::store::{TrustSnapshot, TrustStore};
use crate::trust_matrix::TrustMatrixBuilder;
use crate::update::ReputationStrategy;

/// Strategy selection for the trust pipeline, chosen once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub fusion: FusionStrategy,
    pub reputation: ReputationStrategy,
    /// Precision noise added to the direct matrix. `None` disables it.
    pub noise: Option<PrecisionNoise>,
    /// Precision noise added to each new reputation before it is bounded.
    /// `None` disables it. Without it the two-state strategy never leaves
    /// its neutral starting point.
    pub reputation_noise: Option<PrecisionNoise>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            fusion: FusionStrategy::default(),
            reputation: ReputationStrategy::default(),
            noise: Some(PrecisionNoise::default()),
            reputation_noise: None,
        }
    }
}

impl TrustConfig {
    /// Check every strategy parameter.
    pub fn validate(&self) -> Result<(), V2xError> {
        self.fusion.validate()?;
        self.reputation.validate()?;
        for noise in self.noise.iter().chain(self.reputation_noise.iter()) {
            noise.validate()?;
        }
        Ok(())
    }
}

/// Runs the trust pipeline for a fixed-size fleet.
#[derive(Debug)]
pub struct TrustEngine {
    scorer: TrustScorer,
    config: TrustConfig,
    num_vehicles: usize,
}

impl TrustEngine {
    /// Create an engine.
    ///
    /// # Errors
    /// Returns `V2xError::Config` for invalid strategy parameters or an
    /// empty fleet.
    pub fn new(
        scorer: TrustScorer,
        config: TrustConfig,
        num_vehicles: usize,
    ) -> Result<Self, V2xError> {
        if num_vehicles == 0 {
            return Err(V2xError::Config("num_vehicles must be at least 1".into()));
        }
        config.validate()?;
        if matches!(config.reputation, ReputationStrategy::TwoState { .. })
            && config.reputation_noise.is_none()
        {
            tracing::warn!(
                "two_state reputation without reputation_noise stays at the neutral prior"
            );
        }
        Ok(Self {
            scorer,
            config,
            num_vehicles,
        })
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Build a complete snapshot from every beacon seen so far.
    ///
    /// # Errors
    /// Propagates scoring errors and `UnknownVehicle` for beacons outside
    /// the fleet.
    pub fn compute<R: Rng + ?Sized>(
        &self,
        beacons: &[Beacon],
        cycle: u64,
        rng: &mut R,
    ) -> Result<TrustSnapshot, V2xError> {
        let builder = TrustMatrixBuilder::new(&self.scorer, self.num_vehicles);
        let mut direct = builder.build(beacons)?;
        if let Some(noise) = &self.config.noise {
            noise.apply(&mut direct.matrix, rng);
        }
        let indirect = direct.matrix.indirect();
        let fused = self.config.fusion.fuse(&direct.matrix, &indirect)?;
        let intermediary = intermediary_opinion(&fused);
        let opinions = received_opinion(&fused);

        tracing::debug!(
            cycle,
            beacons = beacons.len(),
            fusion = self.config.fusion.name(),
            "Trust snapshot computed"
        );

        Ok(TrustSnapshot {
            cycle,
            direct: direct.matrix,
            counts: direct.counts,
            indirect,
            fused,
            intermediary,
            opinions,
        })
    }

    /// Sample the per-vehicle reputation offsets for one cycle.
    pub fn reputation_offsets<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        match &self.config.reputation_noise {
            Some(noise) => noise.offsets(self.num_vehicles, rng),
            None => vec![0.0; self.num_vehicles],
        }
    }

    /// Install a computed snapshot with freshly sampled reputation offsets.
    pub fn install<R: Rng + ?Sized>(
        &self,
        store: &mut TrustStore,
        snapshot: TrustSnapshot,
        rng: &mut R,
    ) -> Result<(), V2xError> {
        let offsets = self.reputation_offsets(rng);
        store.install_with_offsets(snapshot, &self.config.reputation, &offsets)
    }

    /// Compute a snapshot and install it into `store` in one step.
    pub fn recompute<R: Rng + ?Sized>(
        &self,
        store: &mut TrustStore,
        beacons: &[Beacon],
        rng: &mut R,
    ) -> Result<(), V2xError> {
        let snapshot = self.compute(beacons, store.cycles() + 1, rng)?;
        self.install(store, snapshot, rng)
    }
}
