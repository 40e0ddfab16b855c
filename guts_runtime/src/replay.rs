//! Replay orchestrator: rebuild a population from its exposure days.
//!
//! Delegates every day to the kernel through a fresh `PopulationEngine`.
//! No cached state.

use crate::config::RunConfig;
use crate::population::{PopulationEngine, PopulationState};
use crate::schedule::ExposureDay;
use crate::RuntimeError;

/// Replay `days` from an unexposed population.
///
/// Returns the final state and its canonical hash. Pure in its inputs.
pub fn rebuild_state(
    config: &RunConfig,
    days: &[ExposureDay],
) -> Result<(PopulationState, String), RuntimeError> {
    let mut engine = PopulationEngine::new(config.clone())?;
    for day in days {
        engine.advance_day(day)?;
    }
    let hash = engine.state_hash();
    Ok((engine.state().clone(), hash))
}

/// Replay `days` on top of a restored state. Days already covered by the
/// state are skipped.
pub fn rebuild_from(
    config: &RunConfig,
    base: PopulationState,
    days: &[ExposureDay],
) -> Result<(PopulationState, String), RuntimeError> {
    let start = base.day;
    let mut engine = PopulationEngine::from_state(config.clone(), base)?;
    for day in days.iter().filter(|d| d.day > start) {
        engine.advance_day(day)?;
    }
    let hash = engine.state_hash();
    Ok((engine.state().clone(), hash))
}

pub fn rebuild_hash(config: &RunConfig, days: &[ExposureDay]) -> Result<String, RuntimeError> {
    let (_, hash) = rebuild_state(config, days)?;
    Ok(hash)
}
