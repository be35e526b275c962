// crates/v2x-reputation/src/trust_matrix.rs
//
// Trust matrix: T_ij trust values between vehicles for the V2X opinion ledger.
//
// Rows are raters and columns are targets. A receiver rates the sender of
// every beacon it hears, so the direct matrix stores the average score of
// the sender's beacons at (receiver, sender). The indirect matrix asks
// everyone else: entry (i, j) is the average of what every vehicle except i
// thinks of j. Both are rebuilt from scratch each cycle.

use serde::{Deserialize, Serialize};

use v2x_core::{Beacon, V2xError};

use crate::scoring::TrustScorer;

/// A dense square trust matrix indexed by zero-based vehicle index.
///
/// Trust values range from 0.0 (no trust) to 1.0 (full trust).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMatrix {
    /// Dense entries: entries[rater][target].
    entries: Vec<Vec<f64>>,
}

impl TrustMatrix {
    /// Create a new zero-initialized `size` x `size` matrix.
    pub fn new(size: usize) -> Self {
        Self {
            entries: vec![vec![0.0; size]; size],
        }
    }

    /// Build a matrix from explicit rows. Values are clamped to [0.0, 1.0].
    ///
    /// # Errors
    /// Returns `V2xError::Validation` if the rows do not form a square matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, V2xError> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return Err(V2xError::Validation(format!(
                "trust matrix must be square ({} rows)",
                size
            )));
        }
        let entries = rows
            .into_iter()
            .map(|row| row.into_iter().map(clamp_unit).collect())
            .collect();
        Ok(Self { entries })
    }

    /// Number of vehicles covered by the matrix.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Set the trust vehicle `from` places in vehicle `to`.
    ///
    /// Values are clamped to [0.0, 1.0].
    pub fn set_trust(&mut self, from: usize, to: usize, value: f64) {
        self.entries[from][to] = clamp_unit(value);
    }

    /// Get the trust vehicle `from` places in vehicle `to`.
    pub fn get_trust(&self, from: usize, to: usize) -> f64 {
        self.entries[from][to]
    }

    /// Borrow the raw rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.entries
    }

    /// Derive the indirect trust matrix by leave-one-out aggregation.
    ///
    /// For i != j: `indirect[i][j] = sum_{k != i} direct[k][j] / (n - 1)`.
    /// The diagonal is never computed and stays 0.
    pub fn indirect(&self) -> TrustMatrix {
        let n = self.size();
        let mut indirect = TrustMatrix::new(n);
        if n < 2 {
            return indirect;
        }
        let column_sums: Vec<f64> = (0..n)
            .map(|j| (0..n).map(|k| self.entries[k][j]).sum())
            .collect();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let others = column_sums[j] - self.entries[i][j];
                    indirect.set_trust(i, j, others / (n - 1) as f64);
                }
            }
        }
        indirect
    }

    /// Row-wise mean: each vehicle's average opinion of the whole network,
    /// diagonal included.
    pub fn row_means(&self) -> Vec<f64> {
        let n = self.size();
        self.entries
            .iter()
            .map(|row| {
                if n == 0 {
                    0.0
                } else {
                    row.iter().sum::<f64>() / n as f64
                }
            })
            .collect()
    }

    /// Column-wise mean over raters other than the subject itself:
    /// how trusted vehicle j is by everyone else.
    pub fn column_means_excluding_diagonal(&self) -> Vec<f64> {
        let n = self.size();
        (0..n)
            .map(|j| {
                if n < 2 {
                    return 0.0;
                }
                let sum: f64 = (0..n).filter(|&i| i != j).map(|i| self.entries[i][j]).sum();
                clamp_unit(sum / (n - 1) as f64)
            })
            .collect()
    }
}

/// The result of accumulating scored beacons into a direct trust matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectTrust {
    /// Averaged direct trust, entries[receiver][sender].
    pub matrix: TrustMatrix,
    /// Number of beacons observed per (receiver, sender) pair.
    pub counts: Vec<Vec<u32>>,
}

/// Accumulates beacon scores into a direct trust matrix.
pub struct TrustMatrixBuilder<'a> {
    scorer: &'a TrustScorer,
    size: usize,
}

impl<'a> TrustMatrixBuilder<'a> {
    /// Create a builder for a fleet of `size` vehicles.
    pub fn new(scorer: &'a TrustScorer, size: usize) -> Self {
        Self { scorer, size }
    }

    /// Score every beacon and average repeated observations of each pair.
    /// The receiver is the rater and the sender is the target.
    ///
    /// Self-pairs are skipped: a vehicle does not rate itself. Cells with
    /// no observations stay 0.
    ///
    /// # Errors
    /// Returns `V2xError::UnknownVehicle` for ids outside 1..=size, and
    /// propagates scoring errors.
    pub fn build(&self, beacons: &[Beacon]) -> Result<DirectTrust, V2xError> {
        let n = self.size;
        let mut sums = vec![vec![0.0_f64; n]; n];
        let mut counts = vec![vec![0_u32; n]; n];

        for beacon in beacons {
            let sender = self.slot(beacon.sender.0)?;
            let receiver = self.slot(beacon.receiver.0)?;
            if sender == receiver {
                continue;
            }
            sums[receiver][sender] += self.scorer.score(beacon)?;
            counts[receiver][sender] += 1;
        }

        let mut matrix = TrustMatrix::new(n);
        for i in 0..n {
            for j in 0..n {
                if counts[i][j] > 0 {
                    matrix.set_trust(i, j, sums[i][j] / counts[i][j] as f64);
                }
            }
        }

        Ok(DirectTrust { matrix, counts })
    }

    fn slot(&self, id: u16) -> Result<usize, V2xError> {
        let id = usize::from(id);
        if id == 0 || id > self.size {
            return Err(V2xError::UnknownVehicle(format!(
                "vehicle_{} is outside the fleet of {} vehicles",
                id, self.size
            )));
        }
        Ok(id - 1)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
