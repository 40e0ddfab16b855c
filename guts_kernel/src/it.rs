/// GUTS kernel: individual tolerance (GUTS-RED-IT)
///
/// Deterministic. Death happens at the first substep whose damage reaches
/// the individual's fixed threshold; randomness only enters when that
/// threshold is sampled (see `threshold`).

use tracing::trace;

use crate::domain::{DayOutcome, GutsModel, GutsParams};
use crate::integrator::Integration;
use crate::invariants::validate_positive;
use crate::state::ExposureState;
use crate::GutsError;

/// One day of IT dynamics. Stops at the first substep with
/// `damage >= threshold`.
pub fn simulate_it(
    threshold: f64,
    state: ExposureState,
    params: &GutsParams,
) -> Result<DayOutcome, GutsError> {
    validate_positive("threshold", threshold)?;

    let mut last = state;
    for sub in Integration::new(state, params, GutsModel::It)? {
        last = sub.state;
        if last.damage >= threshold {
            trace!(step = sub.step, damage = last.damage, threshold, "IT threshold reached");
            return Ok(DayOutcome {
                lethal: true,
                state: last,
            });
        }
    }

    Ok(DayOutcome {
        lethal: false,
        state: last,
    })
}
