// crates/v2x-daemon/tests/integration_pipeline.rs
//
// Integration tests for the V2X ledger daemon.
//
// Tests the wired-up pipeline: beacons scored into trust matrices, reputation
// updates installed into the trust store, validator refresh, forging, and
// the RPC surface on top of the shared ledger.
//
// These tests use the public APIs of the underlying library crates directly
// (v2x-core, v2x-reputation, v2x-consensus, v2x-rpc) since the daemon is a
// binary crate with no lib.rs.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tokio::sync::RwLock;

use v2x_consensus::{ConsensusKind, ForgeOutcome, LedgerConfig, LedgerService};
use v2x_core::{Beacon, ChaChaPayloadCipher, PayloadCipher, VehicleId};
use v2x_reputation::{
    FusionStrategy, ReputationStrategy, ScorerConfig, TrustConfig, TrustEngine, TrustScorer,
    TrustStore,
};
use v2x_rpc::{JsonRpcRequest, RpcConfig, V2xRpcServer};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const POWER: f64 = 2.1725113767870305e-6;

fn beacon(sender: u16, receiver: u16, second: u32, speed: f64) -> Beacon {
    Beacon {
        sender: VehicleId(sender),
        receiver: VehicleId(receiver),
        timestamp: format!("2024-03-01T12:{:02}:{:02}Z", second / 60, second % 60)
            .parse()
            .unwrap(),
        speed,
        received_power: POWER,
        heading: 180.0,
        latitude: 37.775,
        longitude: -122.415,
    }
}

fn ledger(kind: ConsensusKind, seed: u64) -> Arc<LedgerService> {
    let config = LedgerConfig {
        consensus: kind,
        ..LedgerConfig::default()
    };
    Arc::new(
        LedgerService::new(
            &config,
            Arc::new(ChaChaPayloadCipher::from_key([9u8; 32])),
            "rsu1",
            StdRng::seed_from_u64(seed),
        )
        .unwrap(),
    )
}

fn engine(fusion: FusionStrategy, reputation: ReputationStrategy, n: usize) -> TrustEngine {
    TrustEngine::new(
        TrustScorer::new(ScorerConfig::default()).unwrap(),
        TrustConfig {
            fusion,
            reputation,
            noise: None,
            reputation_noise: None,
        },
        n,
    )
    .unwrap()
}

/// Every vehicle rates every other; vehicle `liar` reports implausible speeds.
fn fleet_beacons(n: u16, liar: u16, rounds: u32) -> Vec<Beacon> {
    let mut beacons = Vec::new();
    let mut second = 0;
    for _ in 0..rounds {
        for s in 1..=n {
            for r in 1..=n {
                if s == r {
                    continue;
                }
                let speed = if s == liar { 300.0 } else { 50.0 + f64::from(second % 3) };
                beacons.push(beacon(s, r, second, speed));
                second += 1;
            }
        }
    }
    beacons
}

// ---------------------------------------------------------------------------
// End-to-end ledger flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_three_submissions_seal_into_block_two() {
    let ledger = ledger(ConsensusKind::OpinionProportional, 1);
    ledger.add_validator("vehicle_1", None).await.unwrap();

    for (s, r, m) in [
        ("vehicle_1", "vehicle_2", "a"),
        ("vehicle_2", "vehicle_3", "b"),
        ("vehicle_3", "vehicle_1", "c"),
    ] {
        assert_eq!(ledger.submit_transaction(s, r, m).await.unwrap(), 2);
    }

    let genesis_hash = ledger.chain().await.chain[0].hash().unwrap();
    let ForgeOutcome::Sealed { block } = ledger.forge().await.unwrap() else {
        panic!("expected a sealed block");
    };
    assert_eq!(block.index, 2);
    assert_eq!(block.previous_hash, genesis_hash);
    let senders: Vec<_> = block.transactions.iter().map(|t| t.sender_vehicle.clone()).collect();
    assert_eq!(senders, vec!["vehicle_1", "vehicle_2", "vehicle_3"]);

    let view = ledger.chain().await;
    assert_eq!(view.length, 2);
    for i in 1..view.chain.len() {
        assert_eq!(view.chain[i].previous_hash, view.chain[i - 1].hash().unwrap());
    }
}

#[tokio::test]
async fn test_duplicate_accepted_again_after_seal() {
    let ledger = ledger(ConsensusKind::Unweighted, 2);
    ledger.add_validator("vehicle_1", None).await.unwrap();
    ledger.submit_transaction("vehicle_1", "vehicle_2", "x").await.unwrap();
    assert!(ledger.submit_transaction("vehicle_1", "vehicle_2", "x").await.is_err());
    ledger.forge().await.unwrap();
    assert_eq!(
        ledger.submit_transaction("vehicle_1", "vehicle_2", "x").await.unwrap(),
        3
    );
}

#[test]
fn test_cipher_round_trip_including_empty_and_long() {
    let cipher = ChaChaPayloadCipher::from_key([4u8; 32]);
    let long = "beacon ".repeat(500);
    for message in ["", "short", long.as_str()] {
        let ciphertext = cipher.encrypt(message).unwrap();
        assert_ne!(ciphertext, message);
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), message);
    }
}

// ---------------------------------------------------------------------------
// Trust pipeline feeding validator selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_recompute_refresh_and_forge() {
    let n = 4;
    let ledger = ledger(ConsensusKind::OpinionProportional, 3);
    let store = Arc::new(RwLock::new(TrustStore::new(n)));
    let engine = engine(FusionStrategy::default(), ReputationStrategy::default(), n);
    let beacons = fleet_beacons(n as u16, 0, 2);

    let mut rng = StdRng::seed_from_u64(4);
    let snapshot = engine.compute(&beacons, 1, &mut rng).unwrap();
    {
        let mut guard = store.write().await;
        engine.install(&mut guard, snapshot, &mut rng).unwrap();
    }

    let eligible = store.read().await.eligible_vehicles(0.5);
    assert_eq!(eligible.len(), n, "honest fleet should all be eligible");
    let entries: Vec<(String, f64)> = eligible
        .iter()
        .map(|(id, rep)| (id.ledger_name(), *rep))
        .collect();
    ledger.refresh_validators(&entries).await;

    ledger.submit_transaction("vehicle_1", "vehicle_2", "m").await.unwrap();
    assert!(matches!(
        ledger.forge().await.unwrap(),
        ForgeOutcome::Sealed { .. }
    ));
    ledger.verify_chain().await.unwrap();
}

#[tokio::test]
async fn test_implausible_sender_ranks_lowest_under_every_strategy() {
    let n = 4;
    let liar = 2;
    let liar_slot = VehicleId(liar).index();
    // Every receiver scores the liar's beacons 0, so the liar's column of
    // the direct matrix is empty and its received opinion is the lowest.
    for reputation in [
        ReputationStrategy::default(),
        ReputationStrategy::TwoState { gamma: 0.15 },
    ] {
        for fusion in [FusionStrategy::default(), FusionStrategy::Bayesian] {
            let engine = engine(fusion.clone(), reputation.clone(), n);
            let mut store = TrustStore::new(n);
            let beacons = fleet_beacons(n as u16, liar, 3);
            let mut rng = StdRng::seed_from_u64(5);
            for _ in 0..3 {
                engine.recompute(&mut store, &beacons, &mut rng).unwrap();
            }
            assert_eq!(store.cycles(), 3);

            let snapshot = store.snapshot();
            for i in 0..n {
                assert_eq!(snapshot.direct.get_trust(i, liar_slot), 0.0);
                if i != liar_slot {
                    assert!(snapshot.direct.get_trust(liar_slot, i) > 0.0);
                    assert!(
                        snapshot.opinions[liar_slot] < snapshot.opinions[i],
                        "{:?}: liar {} vs vehicle_{} {}",
                        fusion,
                        snapshot.opinions[liar_slot],
                        i + 1,
                        snapshot.opinions[i]
                    );
                }
            }
            assert!(snapshot.opinions.iter().all(|o| (0.0..=1.0).contains(o)));

            let reps = store.reputations();
            assert!(reps.iter().all(|r| r.is_finite()));
            match reputation {
                ReputationStrategy::DecayedHistory { .. } => {
                    let eligible: Vec<VehicleId> = store
                        .eligible_vehicles(0.5)
                        .into_iter()
                        .map(|(id, _)| id)
                        .collect();
                    assert!(!eligible.contains(&VehicleId(liar)));
                    assert_eq!(eligible.len(), n - 1);
                }
                ReputationStrategy::TwoState { .. } => {
                    assert!(reps.iter().all(|r| (0.0..=1.0).contains(r)));
                }
            }
        }
    }
}

#[tokio::test]
async fn test_selection_frequency_follows_opinion() {
    let ledger = ledger(ConsensusKind::OpinionProportional, 6);
    ledger
        .refresh_validators(&[("heavy".into(), 300.0), ("light".into(), 100.0)])
        .await;

    let mut heavy = 0;
    let rounds = 2_000;
    for _ in 0..rounds {
        let ForgeOutcome::Sealed { block } = ledger.forge().await.unwrap() else {
            panic!("opinions are large enough to always stake");
        };
        if block.validator == "heavy" {
            heavy += 1;
        }
    }
    let share = heavy as f64 / rounds as f64;
    assert!((share - 0.75).abs() < 0.04, "heavy share was {}", share);
}

// ---------------------------------------------------------------------------
// RPC surface
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rpc_reports_installed_reputations() {
    let n = 3;
    let ledger = ledger(ConsensusKind::OpinionProportional, 7);
    let store = Arc::new(RwLock::new(TrustStore::new(n)));
    let server = V2xRpcServer::new(RpcConfig::default(), ledger.clone())
        .with_trust_store(store.clone());

    let engine = engine(
        FusionStrategy::default(),
        ReputationStrategy::TwoState { gamma: 0.15 },
        n,
    );
    {
        let mut guard = store.write().await;
        engine
            .recompute(&mut guard, &fleet_beacons(n as u16, 0, 1), &mut StdRng::seed_from_u64(8))
            .unwrap();
    }

    let resp = server
        .handle(JsonRpcRequest {
            method: "trust/reputations".into(),
            params: json!({}),
        })
        .await;
    assert!(resp.success, "{:?}", resp.error);
    let result = resp.result.unwrap();
    assert_eq!(result["cycle"], 1);
    let vehicles = result["vehicles"].as_array().unwrap();
    assert_eq!(vehicles.len(), n);
    assert_eq!(vehicles[0]["history"].as_array().unwrap().len(), 3);
}
