/// GUTS kernel: dose decay and damage integration
///
/// One day is split into `T` equal substeps. Per substep:
///   1. both external doses decay by `exp(-K / T)` (exact first-order step)
///   2. damage follows `dCi/dt = Kd (dose - Ci)` by one explicit Euler step
///   3. damage is clamped at zero
///
/// Arithmetic is evaluated in a fixed order (divide by `T`, never multiply
/// by `1 / T`) so repeated runs are bit-identical.

use crate::domain::{GutsModel, GutsParams};
use crate::invariants::{validate_params, validate_state};
use crate::state::ExposureState;
use crate::GutsError;

/// Per-substep decay multipliers for both routes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayFactors {
    pub oral: f64,
    pub contact: f64,
}

impl DecayFactors {
    pub fn new(params: &GutsParams) -> Self {
        let steps = params.steps();
        Self {
            oral: (-params.k_sr / steps).exp(),
            contact: (-params.k_ca / steps).exp(),
        }
    }
}

/// `max(0, v)` that always yields `+0.0` at the boundary.
#[inline]
pub fn clamp_non_negative(v: f64) -> f64 {
    if v > 0.0 {
        v
    } else {
        0.0
    }
}

/// One Euler step of `dCi/dt = Kd (dose - Ci)`, clamped at zero.
#[inline]
pub fn advance_damage(damage: f64, dose: f64, kd: f64, steps: f64) -> f64 {
    clamp_non_negative(damage + kd * (dose - damage) / steps)
}

/// SD hazard accumulated over one substep: `max(0, BW (Ci - MW) / T)`.
#[inline]
pub fn hazard_increment(damage: f64, params: &GutsParams) -> f64 {
    clamp_non_negative(params.bw_sd * (damage - params.mw_sd) / params.steps())
}

/// State after a completed substep (1-based).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Substep {
    pub step: u32,
    pub state: ExposureState,
}

/// Iterator over the `T` substeps of one day.
///
/// Construction validates parameters and the starting state; iteration
/// itself cannot fail.
#[derive(Debug, Clone)]
pub struct Integration {
    state: ExposureState,
    decay: DecayFactors,
    kd: f64,
    steps: f64,
    step: u32,
    total: u32,
}

impl Integration {
    pub fn new(
        state: ExposureState,
        params: &GutsParams,
        model: GutsModel,
    ) -> Result<Self, GutsError> {
        validate_params(params)?;
        validate_state(&state)?;
        Ok(Self {
            state,
            decay: DecayFactors::new(params),
            kd: params.kd(model),
            steps: params.steps(),
            step: 0,
            total: params.steps_per_day,
        })
    }
}

impl Iterator for Integration {
    type Item = Substep;

    fn next(&mut self) -> Option<Substep> {
        if self.step >= self.total {
            return None;
        }
        let s = &mut self.state;
        s.oral_dose *= self.decay.oral;
        s.contact_dose *= self.decay.contact;
        let dose = s.external_dose();
        s.damage = advance_damage(s.damage, dose, self.kd, self.steps);

        self.step += 1;
        Some(Substep {
            step: self.step,
            state: self.state,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total - self.step) as usize;
        (left, Some(left))
    }
}

/// Full-day trajectory without any death check.
pub fn trace_day(
    state: ExposureState,
    params: &GutsParams,
    model: GutsModel,
) -> Result<Vec<Substep>, GutsError> {
    Ok(Integration::new(state, params, model)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GutsParams {
        GutsParams {
            steps_per_day: 10,
            ..GutsParams::default()
        }
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(clamp_non_negative(-1.0), 0.0);
        assert_eq!(clamp_non_negative(-0.0).to_bits(), 0.0f64.to_bits());
        assert_eq!(clamp_non_negative(2.5), 2.5);
    }

    #[test]
    fn test_advance_damage_tracks_dose() {
        let d = advance_damage(0.0, 1.0, 0.36, 10.0);
        assert_eq!(d, 0.036);
        // Damage above the dose relaxes downward.
        assert!(advance_damage(2.0, 1.0, 0.36, 10.0) < 2.0);
    }

    #[test]
    fn test_advance_damage_clamps_overshoot() {
        // Kd / T > 1 overshoots below zero without the clamp.
        assert_eq!(advance_damage(1.0, 0.0, 30.0, 10.0), 0.0);
    }

    #[test]
    fn test_hazard_zero_below_median() {
        let p = params();
        assert_eq!(hazard_increment(0.0, &p), 0.0);
        assert_eq!(hazard_increment(p.mw_sd, &p), 0.0);
        assert!(hazard_increment(p.mw_sd * 2.0, &p) > 0.0);
    }

    #[test]
    fn test_integration_yields_t_substeps() {
        let p = params();
        let subs = trace_day(ExposureState::new(1.0, 0.5, 0.0), &p, GutsModel::Sd).unwrap();
        assert_eq!(subs.len(), 10);
        assert_eq!(subs[0].step, 1);
        assert_eq!(subs[9].step, 10);
    }

    #[test]
    fn test_day_decay_matches_closed_form() {
        let p = params();
        let subs = trace_day(ExposureState::new(1.0, 1.0, 0.0), &p, GutsModel::It).unwrap();
        let last = subs.last().unwrap().state;
        assert!((last.oral_dose - (-p.k_sr).exp()).abs() < 1e-12);
        assert!((last.contact_dose - (-p.k_ca).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_substep_damage_uses_combined_decayed_dose() {
        let p = params();
        let first = trace_day(ExposureState::new(0.8, 0.3, 0.01), &p, GutsModel::Sd).unwrap()[0];
        let decay = DecayFactors::new(&p);
        let decayed = ExposureState::new(0.8 * decay.oral, 0.3 * decay.contact, 0.01);
        let expected = advance_damage(0.01, decayed.external_dose(), p.kd_sd, p.steps());
        assert_eq!(first.state.damage.to_bits(), expected.to_bits());
    }

    #[test]
    fn test_integration_rejects_negative_dose() {
        let err = Integration::new(ExposureState::new(-1.0, 0.0, 0.0), &params(), GutsModel::Sd)
            .unwrap_err();
        assert!(err.is_invalid_parameter());
    }
}
