/// GUTS kernel: individual tolerance thresholds
///
/// Log-logistic transform with median `MW_IT` and spread factor `F_S`:
///
///   beta = ln(39) / ln(F_S)
///   F    = 1 / (1 + (z / MW_IT)^(-beta))
///
/// Each IT individual gets one threshold for its whole life.

use serde::{Deserialize, Serialize};

use crate::domain::GutsParams;
use crate::invariants::{validate_open_unit, validate_positive, validate_spread};
use crate::random::UniformSource;
use crate::GutsError;

/// Entries in the precomputed table kept by the colony model.
pub const DEFAULT_TABLE_RESOLUTION: usize = 1000;

/// Shape parameter of the log-logistic distribution.
pub fn log_logistic_beta(f_s: f64) -> Result<f64, GutsError> {
    validate_spread(f_s)?;
    Ok(39f64.ln() / f_s.ln())
}

/// Map a draw `z` in (0, 1) to a strictly positive threshold.
///
/// Out-of-domain inputs fail with `InvalidParameter` rather than returning
/// NaN or infinity.
pub fn sample_threshold(z: f64, f_s: f64, mw_it: f64) -> Result<f64, GutsError> {
    validate_open_unit("z", z)?;
    validate_positive("MW_IT", mw_it)?;
    let beta = log_logistic_beta(f_s)?;

    let f = 1.0 / (1.0 + (z / mw_it).powf(-beta));
    if !(f > 0.0 && f.is_finite()) {
        return Err(GutsError::invalid("z", z, "threshold underflows to zero"));
    }
    Ok(f)
}

/// Draw from `rng` and transform with the parameter set's `F_S` / `MW_IT`.
///
/// Fails for a draw of exactly 0, and also for valid parameters when the
/// transform overflows: with `F_S` close to 1 the exponent is huge, so
/// draws below `MW_IT` drive `(z / MW_IT)^(-beta)` to infinity and the
/// threshold to zero. `ThresholdTable` cells avoid the extreme tails.
pub fn draw_threshold<R: UniformSource + ?Sized>(
    rng: &mut R,
    params: &GutsParams,
) -> Result<f64, GutsError> {
    sample_threshold(rng.next_uniform(), params.f_s, params.mw_it)
}

/// Thresholds precomputed on a uniform grid of midpoint draws.
///
/// `lookup(u)` returns the entry of cell `floor(u * resolution)`, trading
/// resolution for a single index per individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    entries: Vec<f64>,
}

impl ThresholdTable {
    pub fn build(params: &GutsParams, resolution: usize) -> Result<Self, GutsError> {
        if resolution == 0 {
            return Err(GutsError::invalid(
                "resolution",
                0.0,
                "table needs at least one entry",
            ));
        }
        let n = resolution as f64;
        let entries = (0..resolution)
            .map(|k| sample_threshold((k as f64 + 0.5) / n, params.f_s, params.mw_it))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn with_default_resolution(params: &GutsParams) -> Result<Self, GutsError> {
        Self::build(params, DEFAULT_TABLE_RESOLUTION)
    }

    pub fn resolution(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[f64] {
        &self.entries
    }

    /// Threshold for a draw `u` in [0, 1).
    pub fn lookup(&self, u: f64) -> Result<f64, GutsError> {
        if !(0.0..1.0).contains(&u) {
            return Err(GutsError::invalid("u", u, "must lie in [0, 1)"));
        }
        let idx = ((u * self.entries.len() as f64) as usize).min(self.entries.len() - 1);
        Ok(self.entries[idx])
    }
}
