// crates/v2x-daemon/src/beacons.rs
//
// Beacon directory loader.
//
// Each file holds one basic safety message recorded by the roadside unit.
// The file name carries the vehicle pair: `bsm<sender>_<receiver>.json`.
// Other files are ignored. Beacons are returned oldest first; ties keep
// file-name order so runs are reproducible.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use v2x_core::{Beacon, BeaconRecord, BeaconSource, V2xError, VehicleId};

/// Loads beacons from a directory of `bsm<sender>_<receiver>.json` files.
#[derive(Debug, Clone)]
pub struct BeaconDirectory {
    dir: PathBuf,
}

impl BeaconDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

/// Parse `bsm<sender>_<receiver>.json` into the vehicle pair.
pub fn parse_file_name(name: &str) -> Option<(VehicleId, VehicleId)> {
    let stem = name.strip_prefix("bsm")?.strip_suffix(".json")?;
    let (sender, receiver) = stem.split_once('_')?;
    let sender: u16 = sender.parse().ok()?;
    let receiver: u16 = receiver.parse().ok()?;
    Some((VehicleId(sender), VehicleId(receiver)))
}

#[async_trait]
impl BeaconSource for BeaconDirectory {
    async fn load_beacons(&self) -> Result<Vec<Beacon>, V2xError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            V2xError::Storage(format!("cannot read {}: {}", self.dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| V2xError::Storage(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            match parse_file_name(&name) {
                Some(pair) => files.push((name, pair)),
                None => tracing::debug!(file = %name, "Skipping non-beacon file"),
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut beacons = Vec::with_capacity(files.len());
        for (name, (sender, receiver)) in files {
            let path = self.dir.join(&name);
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| V2xError::Storage(format!("cannot read {}: {}", path.display(), e)))?;
            let record: BeaconRecord = serde_json::from_str(&contents).map_err(|e| {
                V2xError::Serialization(format!("invalid beacon {}: {}", name, e))
            })?;
            beacons.push(Beacon::from_record(sender, receiver, record));
        }

        // Stable sort: equal timestamps keep file-name order.
        beacons.sort_by_key(|b| b.timestamp);
        tracing::info!(
            count = beacons.len(),
            dir = %self.dir.display(),
            "Loaded beacons"
        );
        Ok(beacons)
    }
}
