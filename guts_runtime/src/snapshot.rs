//! Snapshot layer: deterministic population snapshots.
//!
//! A snapshot stores the serde JSON of the population together with the
//! canonical hash of its individuals. No timestamps in snapshot content.
//!
//! If a snapshot does not verify, fall back to full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use guts_kernel::KERNEL_VERSION;

use crate::config::RunConfig;
use crate::population::{validate_population, PopulationState};
use crate::RuntimeError;

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Last simulated day contained in the snapshot.
    pub day: u64,
    /// Population JSON (serde encoding of `PopulationState`).
    pub state_json: String,
    /// Canonical hash of the individuals.
    pub hash: String,
    /// Kernel version at snapshot time.
    pub kernel_version: u32,
}

fn snapshot_path(dir: &Path, day: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", day))
}

// ── Codec ──────────────────────────────────────────────────────

/// Encode a population. Identical states encode to identical bytes.
pub fn encode_state(state: &PopulationState) -> Result<String, RuntimeError> {
    Ok(serde_json::to_string(state)?)
}

/// Strict decode: unknown or missing fields fail. No validation; see
/// `restore_snapshot`.
pub fn decode_state(json: &str) -> Result<PopulationState, RuntimeError> {
    Ok(serde_json::from_str(json)?)
}

/// Build a snapshot of `state`.
pub fn make_snapshot(state: &PopulationState) -> Result<Snapshot, RuntimeError> {
    Ok(Snapshot {
        day: state.day,
        state_json: encode_state(state)?,
        hash: state.hash(),
        kernel_version: KERNEL_VERSION,
    })
}

// ── Files ──────────────────────────────────────────────────────

/// Write `snapshot_<day>.json` into `dir` and fsync it.
pub fn save_snapshot(dir: &Path, state: &PopulationState) -> Result<PathBuf, RuntimeError> {
    fs::create_dir_all(dir)?;
    let snap = make_snapshot(state)?;
    let content = serde_json::to_string(&snap)?;

    let path = snapshot_path(dir, state.day);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// Snapshot taken after `day`, if present.
pub fn load_snapshot(dir: &Path, day: u64) -> Result<Option<Snapshot>, RuntimeError> {
    let path = snapshot_path(dir, day);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Snapshot with the highest day in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, RuntimeError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let day = name
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(day) = day {
            if best.map_or(true, |b| day > b) {
                best = Some(day);
            }
        }
    }

    match best {
        Some(day) => load_snapshot(dir, day),
        None => Ok(None),
    }
}

// ── Verification ───────────────────────────────────────────────

/// True if the stored hash matches the decoded population.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    match decode_state(&snap.state_json) {
        Ok(state) => state.day == snap.day && state.hash() == snap.hash,
        Err(_) => false,
    }
}

/// Decode, check hash and kernel version, then validate the population
/// against `config`. The safe entry point for loading snapshots.
pub fn restore_snapshot(config: &RunConfig, snap: &Snapshot) -> Result<PopulationState, RuntimeError> {
    if snap.kernel_version != KERNEL_VERSION {
        return Err(RuntimeError::InvariantViolation(format!(
            "snapshot from kernel v{}, this is kernel v{}",
            snap.kernel_version, KERNEL_VERSION
        )));
    }
    let state = decode_state(&snap.state_json)?;
    if state.day != snap.day || state.hash() != snap.hash {
        return Err(RuntimeError::InvariantViolation(format!(
            "snapshot for day {} does not match its hash",
            snap.day
        )));
    }
    validate_population(config, &state)?;
    Ok(state)
}
