// crates/v2x-reputation/src/scoring.rs
//
// Per-beacon trust scoring for the V2X opinion ledger.
//
// Each monitored beacon parameter is judged on its own (how far speed or
// received power strays from the expected average, whether the reported
// position sits inside the admissible area), and the per-parameter trusts
// are aggregated with a geometric mean so that one strongly distrusted
// parameter drags the whole beacon down.

use serde::{Deserialize, Serialize};

use v2x_core::{Beacon, V2xError};

/// Trust assigned to a coordinate inside its admissible range.
pub const IN_RANGE_TRUST: f64 = 0.9;

/// Trust assigned to a coordinate outside its admissible range.
///
/// Never zero: GPS noise is common, so position trust degrades but is not
/// zeroed.
pub const OUT_OF_RANGE_TRUST: f64 = 0.5;

/// A parameter judged by its relative deviation from an expected average.
///
/// `thresholds` holds (relative deviation, trust) pairs. The trust of the
/// first threshold the deviation does not exceed is returned; beyond the
/// last threshold the trust is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationParameter {
    /// Expected average value. Must be non-zero.
    pub average: f64,
    /// (relative deviation threshold, trust) pairs, ascending by threshold.
    pub thresholds: Vec<(f64, f64)>,
}

impl DeviationParameter {
    /// Create a parameter, sorting thresholds ascending.
    pub fn new(average: f64, mut thresholds: Vec<(f64, f64)>) -> Self {
        thresholds.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            average,
            thresholds,
        }
    }

    /// Trust for a single observed value.
    ///
    /// # Errors
    /// Returns `V2xError::UndefinedAverageParameter` if the average is zero.
    pub fn trust(&self, name: &str, value: f64) -> Result<f64, V2xError> {
        if self.average == 0.0 || !self.average.is_finite() {
            return Err(V2xError::UndefinedAverageParameter(name.to_string()));
        }
        let deviation = ((value - self.average) / self.average).abs();
        for &(threshold, trust) in &self.thresholds {
            if deviation <= threshold {
                return Ok(trust);
            }
        }
        Ok(0.0)
    }

    fn validate(&mut self, name: &str) -> Result<(), V2xError> {
        if self.average == 0.0 || !self.average.is_finite() {
            return Err(V2xError::UndefinedAverageParameter(name.to_string()));
        }
        for &(threshold, trust) in &self.thresholds {
            if !(threshold >= 0.0) {
                return Err(V2xError::Config(format!(
                    "{}: deviation threshold {} must be non-negative",
                    name, threshold
                )));
            }
            if !(0.0..=1.0).contains(&trust) {
                return Err(V2xError::Config(format!(
                    "{}: trust value {} must be within [0, 1]",
                    name, trust
                )));
            }
        }
        self.thresholds
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(())
    }
}

/// An admissible coordinate range (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRange {
    pub min: f64,
    pub max: f64,
}

impl PositionRange {
    /// Trust for a coordinate: [`IN_RANGE_TRUST`] inside, [`OUT_OF_RANGE_TRUST`] outside.
    pub fn trust(&self, value: f64) -> f64 {
        if self.min <= value && value <= self.max {
            IN_RANGE_TRUST
        } else {
            OUT_OF_RANGE_TRUST
        }
    }
}

/// Which beacon parameters are scored, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Vehicle speed.
    pub speed: DeviationParameter,
    /// Received signal power.
    pub received_power: DeviationParameter,
    /// Heading. Not scored unless configured.
    pub heading: Option<DeviationParameter>,
    /// Admissible latitude range.
    pub latitude: PositionRange,
    /// Admissible longitude range.
    pub longitude: PositionRange,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        let standard = vec![(0.1, 0.9), (0.3, 0.6), (1.0, 0.1)];
        Self {
            speed: DeviationParameter::new(50.0, standard.clone()),
            received_power: DeviationParameter::new(2.1725113767870305e-6, standard),
            heading: None,
            latitude: PositionRange {
                min: 37.77,
                max: 37.78,
            },
            longitude: PositionRange {
                min: -122.42,
                max: -122.41,
            },
        }
    }
}

impl ScorerConfig {
    /// The heading parameter used by the older traces, for deployments
    /// that want heading scored.
    pub fn default_heading() -> DeviationParameter {
        DeviationParameter::new(180.0, vec![(0.1, 0.9), (0.5, 0.6), (1.0, 0.1)])
    }
}

/// Converts one beacon into a single trust value in [0, 1].
#[derive(Debug, Clone)]
pub struct TrustScorer {
    config: ScorerConfig,
}

impl TrustScorer {
    /// Create a scorer, validating the configuration.
    ///
    /// # Errors
    /// Returns `V2xError::UndefinedAverageParameter` for a zero average and
    /// `V2xError::Config` for thresholds or trusts outside their domain.
    pub fn new(mut config: ScorerConfig) -> Result<Self, V2xError> {
        config.speed.validate("speed")?;
        config.received_power.validate("received_power")?;
        if let Some(heading) = config.heading.as_mut() {
            heading.validate("heading")?;
        }
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Per-parameter trusts for a beacon, in a fixed order:
    /// speed, received power, latitude, longitude, then heading if scored.
    pub fn parameter_trusts(&self, beacon: &Beacon) -> Result<Vec<f64>, V2xError> {
        let mut trusts = Vec::with_capacity(5);
        trusts.push(self.config.speed.trust("speed", beacon.speed)?);
        trusts.push(
            self.config
                .received_power
                .trust("received_power", beacon.received_power)?,
        );
        trusts.push(self.config.latitude.trust(beacon.latitude));
        trusts.push(self.config.longitude.trust(beacon.longitude));
        if let Some(heading) = &self.config.heading {
            trusts.push(heading.trust("heading", beacon.heading)?);
        }
        Ok(trusts)
    }

    /// Aggregate trust for a beacon.
    pub fn score(&self, beacon: &Beacon) -> Result<f64, V2xError> {
        let trusts = self.parameter_trusts(beacon)?;
        Ok(geometric_mean(&trusts))
    }
}

/// Geometric mean of trust values, clamped to [0, 1].
///
/// Returns 0.0 for an empty slice.
pub fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let product: f64 = values.iter().product();
    if product <= 0.0 {
        return 0.0;
    }
    product.powf(1.0 / values.len() as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use v2x_core::VehicleId;

    fn beacon(speed: f64, power: f64, lat: f64, lon: f64) -> Beacon {
        Beacon {
            sender: VehicleId(1),
            receiver: VehicleId(2),
            timestamp: "2024-03-01T12:00:00Z".parse().unwrap(),
            speed,
            received_power: power,
            heading: 180.0,
            latitude: lat,
            longitude: lon,
        }
    }

    const POWER: f64 = 2.1725113767870305e-6;

    #[test]
    fn test_geometric_mean_empty_is_zero() {
        assert_eq!(geometric_mean(&[]), 0.0);
    }

    #[test]
    fn test_geometric_mean_weakest_link() {
        assert!((geometric_mean(&[0.9, 0.9]) - 0.9).abs() < 1e-12);
        assert_eq!(geometric_mean(&[0.9, 0.9, 0.0]), 0.0);
        assert!(geometric_mean(&[0.9, 0.1]) < (0.9 + 0.1) / 2.0);
    }

    #[test]
    fn test_deviation_threshold_steps() {
        let p = DeviationParameter::new(50.0, vec![(0.1, 0.9), (0.3, 0.6), (1.0, 0.1)]);
        assert_eq!(p.trust("speed", 50.0).unwrap(), 0.9);
        assert_eq!(p.trust("speed", 55.0).unwrap(), 0.9);
        assert_eq!(p.trust("speed", 60.0).unwrap(), 0.6);
        assert_eq!(p.trust("speed", 90.0).unwrap(), 0.1);
        assert_eq!(p.trust("speed", 101.0).unwrap(), 0.0);
    }

    #[test]
    fn test_unsorted_thresholds_are_sorted() {
        let p = DeviationParameter::new(50.0, vec![(1.0, 0.1), (0.1, 0.9), (0.3, 0.6)]);
        assert_eq!(p.thresholds[0], (0.1, 0.9));
        assert_eq!(p.trust("speed", 51.0).unwrap(), 0.9);
    }

    #[test]
    fn test_zero_average_is_hard_error() {
        let p = DeviationParameter::new(0.0, vec![(0.1, 0.9)]);
        let err = p.trust("speed", 10.0).unwrap_err();
        assert!(matches!(err, V2xError::UndefinedAverageParameter(ref n) if n == "speed"));

        let mut config = ScorerConfig::default();
        config.received_power.average = 0.0;
        assert!(matches!(
            TrustScorer::new(config),
            Err(V2xError::UndefinedAverageParameter(_))
        ));
    }

    #[test]
    fn test_invalid_trust_value_rejected() {
        let mut config = ScorerConfig::default();
        config.speed.thresholds = vec![(0.1, 1.5)];
        assert!(matches!(TrustScorer::new(config), Err(V2xError::Config(_))));
    }

    #[test]
    fn test_position_never_zero() {
        let range = PositionRange {
            min: 37.77,
            max: 37.78,
        };
        assert_eq!(range.trust(37.775), IN_RANGE_TRUST);
        assert_eq!(range.trust(37.77), IN_RANGE_TRUST);
        assert_eq!(range.trust(10.0), OUT_OF_RANGE_TRUST);
    }

    #[test]
    fn test_well_behaved_beacon_scores_high() {
        let scorer = TrustScorer::new(ScorerConfig::default()).unwrap();
        let score = scorer.score(&beacon(50.0, POWER, 37.775, -122.415)).unwrap();
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_missing_power_degrades_score() {
        // Traces without receivedPower deviate by 100%, which is within the
        // last threshold, so the power trust is 0.1 rather than 0.
        let scorer = TrustScorer::new(ScorerConfig::default()).unwrap();
        let score = scorer.score(&beacon(50.0, 0.0, 37.775, -122.415)).unwrap();
        let expected = (0.9_f64 * 0.1 * 0.9 * 0.9).powf(0.25);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_implausible_speed_zeroes_score() {
        let scorer = TrustScorer::new(ScorerConfig::default()).unwrap();
        let score = scorer.score(&beacon(500.0, POWER, 37.775, -122.415)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_heading_scored_when_configured() {
        let mut config = ScorerConfig::default();
        config.heading = Some(ScorerConfig::default_heading());
        let scorer = TrustScorer::new(config).unwrap();
        let trusts = scorer.parameter_trusts(&beacon(50.0, POWER, 37.775, -122.415)).unwrap();
        assert_eq!(trusts.len(), 5);
        assert_eq!(trusts[4], 0.9);
    }

    #[test]
    fn test_scores_bounded_over_grid() {
        let scorer = TrustScorer::new(ScorerConfig::default()).unwrap();
        for speed in [0.0, 10.0, 45.0, 50.0, 70.0, 120.0, 1000.0] {
            for power in [0.0, 1e-6, POWER, 5e-6] {
                for (lat, lon) in [(37.775, -122.415), (0.0, 0.0)] {
                    let s = scorer.score(&beacon(speed, power, lat, lon)).unwrap();
                    assert!((0.0..=1.0).contains(&s), "score {} out of range", s);
                }
            }
        }
    }
}
