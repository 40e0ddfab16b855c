/// GUTS kernel: stochastic death (GUTS-RED-SD)
///
/// After each substep the hazard `h = max(0, BW_SD (Ci - MW_SD) / T)` is
/// turned into a Bernoulli trial: the individual dies when a uniform draw
/// exceeds the substep survival probability `exp(-h)`.

use tracing::trace;

use crate::domain::{CohortOutcome, DayOutcome, DeathPolicy, GutsModel, GutsParams};
use crate::integrator::{hazard_increment, Integration};
use crate::invariants::validate_non_negative;
use crate::random::UniformSource;
use crate::state::ExposureState;
use crate::GutsError;

/// Cohorts at least this large lose `round(n (1 - exp(-h)))` members per
/// substep instead of drawing one trial per member.
pub const COHORT_BULK_THRESHOLD: u64 = 100;

/// One day of SD dynamics for one individual under the given death policy.
///
/// `StopOnFirstDeath` returns the state at the lethal substep.
/// `ContinueAfterDeath` integrates and draws for the whole day; `lethal`
/// stays true once tripped. Both consume identical draws up to the first
/// lethal substep, so they always agree on `lethal`.
pub fn simulate_sd<R: UniformSource + ?Sized>(
    state: ExposureState,
    params: &GutsParams,
    rng: &mut R,
    policy: DeathPolicy,
) -> Result<DayOutcome, GutsError> {
    let mut lethal = false;
    let mut last = state;

    for sub in Integration::new(state, params, GutsModel::Sd)? {
        last = sub.state;
        let h = hazard_increment(last.damage, params);
        if rng.next_uniform() > (-h).exp() {
            if !lethal {
                trace!(step = sub.step, damage = last.damage, hazard = h, "SD lethal draw");
            }
            lethal = true;
            if policy == DeathPolicy::StopOnFirstDeath {
                break;
            }
        }
    }

    Ok(DayOutcome {
        lethal,
        state: last,
    })
}

/// SD day that stops at the first lethal substep.
pub fn simulate_sd_stop<R: UniformSource + ?Sized>(
    state: ExposureState,
    params: &GutsParams,
    rng: &mut R,
) -> Result<DayOutcome, GutsError> {
    simulate_sd(state, params, rng, DeathPolicy::StopOnFirstDeath)
}

/// SD day that always integrates all substeps.
pub fn simulate_sd_continue<R: UniformSource + ?Sized>(
    state: ExposureState,
    params: &GutsParams,
    rng: &mut R,
) -> Result<DayOutcome, GutsError> {
    simulate_sd(state, params, rng, DeathPolicy::ContinueAfterDeath)
}

/// One day of SD dynamics for an in-hive cohort of `count` identical
/// members sharing one oral dose and damage level (no contact route).
///
/// Large cohorts lose the expected number of members per substep; small
/// ones draw a trial per member. The branch is re-evaluated every substep.
pub fn simulate_sd_cohort<R: UniformSource + ?Sized>(
    count: u64,
    oral_dose: f64,
    damage: f64,
    params: &GutsParams,
    rng: &mut R,
) -> Result<CohortOutcome, GutsError> {
    validate_non_negative("oral_dose", oral_dose)?;
    let start = ExposureState::new(oral_dose, 0.0, damage);
    let mut alive = count;
    let mut last = start;

    for sub in Integration::new(start, params, GutsModel::Sd)? {
        last = sub.state;
        let h = hazard_increment(last.damage, params);
        let survival = (-h).exp();

        let deaths = if alive >= COHORT_BULK_THRESHOLD {
            (alive as f64 * (1.0 - survival)).round() as u64
        } else {
            (0..alive).filter(|_| rng.next_uniform() > survival).count() as u64
        };
        alive = alive.saturating_sub(deaths);
    }

    Ok(CohortOutcome {
        survivors: alive,
        oral_dose: last.oral_dose,
        damage: last.damage,
    })
}
