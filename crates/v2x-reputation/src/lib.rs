// crates/v2x-reputation/src/lib.rs
//
// v2x-reputation: Trust scoring, trust matrices, opinion fusion, and
// reputation history for the V2X opinion ledger.
//
// Beacons are scored for physical plausibility, aggregated into direct and
// indirect trust matrices, fused into a per-vehicle opinion, and folded into
// a short rolling reputation history. The resulting reputations decide which
// vehicles may forge ledger blocks and with what weight.

pub mod engine;
pub mod fusion;
pub mod history;
pub mod noise;
pub mod scoring;
pub mod store;
pub mod trust_matrix;
pub mod update;

pub use engine::{TrustConfig, TrustEngine};
pub use fusion::FusionStrategy;
pub use history::{ReputationRecord, HISTORY_DEPTH, NEUTRAL_REPUTATION};
pub use noise::PrecisionNoise;
pub use scoring::{ScorerConfig, TrustScorer};
pub use store::{TrustSnapshot, TrustStore};
pub use trust_matrix::{DirectTrust, TrustMatrix, TrustMatrixBuilder};
pub use update::ReputationStrategy;
