//! Drift detection: determinism verification and population comparison.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::RunConfig;
use crate::population::PopulationState;
use crate::replay;
use crate::schedule::ExposureDay;
use crate::RuntimeError;

/// Replay the same days twice and require identical hashes.
pub fn verify_determinism(config: &RunConfig, days: &[ExposureDay]) -> Result<String, RuntimeError> {
    let hash1 = replay::rebuild_hash(config, days)?;
    let hash2 = replay::rebuild_hash(config, days)?;
    if hash1 != hash2 {
        return Err(RuntimeError::Determinism {
            run1: hash1,
            run2: hash2,
        });
    }
    Ok(hash1)
}

/// Compare two populations, typically two experiment variants after the
/// same number of days.
pub fn compare_states(
    state_a: &PopulationState,
    state_b: &PopulationState,
) -> Result<DriftReport, RuntimeError> {
    let dead_a: BTreeSet<u64> = dead_ids(state_a);
    let dead_b: BTreeSet<u64> = dead_ids(state_b);

    let alive_a = state_a.alive() as i64;
    let alive_b = state_b.alive() as i64;
    let damage_a = mean_damage(state_a)?;
    let damage_b = mean_damage(state_b)?;

    Ok(DriftReport {
        day_a: state_a.day,
        day_b: state_b.day,
        alive_a,
        alive_b,
        alive_delta: alive_b - alive_a,
        mean_damage_a: damage_a,
        mean_damage_b: damage_b,
        mean_damage_delta: damage_b - damage_a,
        died_only_in_a: dead_a.difference(&dead_b).copied().collect(),
        died_only_in_b: dead_b.difference(&dead_a).copied().collect(),
        identical: state_a.hash() == state_b.hash(),
    })
}

fn dead_ids(state: &PopulationState) -> BTreeSet<u64> {
    state
        .individuals
        .iter()
        .filter(|(_, ind)| !ind.is_alive())
        .map(|(id, _)| *id)
        .collect()
}

/// Mean damage over living individuals; 0 when nobody is alive.
fn mean_damage(state: &PopulationState) -> Result<f64, RuntimeError> {
    Ok(state.pooled_exposure()?.map(|s| s.damage).unwrap_or(0.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub day_a: u64,
    pub day_b: u64,
    pub alive_a: i64,
    pub alive_b: i64,
    pub alive_delta: i64,
    pub mean_damage_a: f64,
    pub mean_damage_b: f64,
    pub mean_damage_delta: f64,
    pub died_only_in_a: Vec<u64>,
    pub died_only_in_b: Vec<u64>,
    /// Canonical hashes match.
    pub identical: bool,
}
