/// GUTS kernel: daily exposure records
///
/// Exposure is computed upstream (foraging, food consumption) and handed
/// to the kernel as pure data: one record per individual per day.

use serde::{Deserialize, Serialize};

use crate::invariants::{validate_non_negative, validate_state};
use crate::state::ExposureState;
use crate::GutsError;

/// External intake of one individual on one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyExposure {
    /// Simulated day, starting at 1.
    pub day: u64,
    #[serde(default)]
    pub oral_dose: f64,
    #[serde(default)]
    pub contact_dose: f64,
}

impl DailyExposure {
    pub fn new(day: u64, oral_dose: f64, contact_dose: f64) -> Self {
        Self {
            day,
            oral_dose,
            contact_dose,
        }
    }

    /// A day without any new intake.
    pub fn none(day: u64) -> Self {
        Self::new(day, 0.0, 0.0)
    }

    pub fn validate(&self) -> Result<(), GutsError> {
        validate_non_negative("oral_dose", self.oral_dose)?;
        validate_non_negative("contact_dose", self.contact_dose)?;
        Ok(())
    }
}

/// Count-weighted mean of two pooled groups.
///
/// Used when individuals or cohorts merge and their damage, residual dose
/// or threshold has to be carried over as one value.
pub fn merge_weighted(
    count_a: u64,
    value_a: f64,
    count_b: u64,
    value_b: f64,
) -> Result<f64, GutsError> {
    let total = count_a + count_b;
    if total == 0 {
        return Err(GutsError::invalid("count", 0.0, "cannot pool two empty groups"));
    }
    let sum_a = value_a * count_a as f64;
    let sum_b = value_b * count_b as f64;
    Ok((sum_a + sum_b) / total as f64)
}

/// Pool two exposure states field by field.
pub fn merge_states(
    count_a: u64,
    a: &ExposureState,
    count_b: u64,
    b: &ExposureState,
) -> Result<ExposureState, GutsError> {
    validate_state(a)?;
    validate_state(b)?;
    Ok(ExposureState {
        oral_dose: merge_weighted(count_a, a.oral_dose, count_b, b.oral_dose)?,
        contact_dose: merge_weighted(count_a, a.contact_dose, count_b, b.contact_dose)?,
        damage: merge_weighted(count_a, a.damage, count_b, b.damage)?,
    })
}
