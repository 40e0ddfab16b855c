/// GUTS kernel: core domain types
///
/// Pure data. Integration lives in `integrator`, death checks in `sd` / `it`.
/// JSON field names follow the parameter files of the colony model
/// (`T`, `K_SR`, `Kd_SD`, ...), so existing configurations load unchanged.

use serde::{Deserialize, Serialize};

use crate::state::ExposureState;

// ── Model selection ───────────────────────────────────────────────

/// Which death policy the host runs for its individuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GutsModel {
    /// Stochastic death: hazard-driven Bernoulli trial per substep.
    #[serde(rename = "SD")]
    Sd,
    /// Individual tolerance: death once damage reaches a fixed threshold.
    #[serde(rename = "IT")]
    It,
}

/// What the SD kernel does after the first lethal draw of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathPolicy {
    /// Stop integrating at the lethal substep.
    #[default]
    StopOnFirstDeath,
    /// Keep integrating (and drawing) for the rest of the day; the lethal
    /// flag stays set.
    ContinueAfterDeath,
}

// ── Parameters ────────────────────────────────────────────────────

/// Per-compound GUTS-RED constants. Read-only for the lifetime of a run.
///
/// Rates are per day; `steps_per_day` equal substeps are integrated per
/// kernel call. Missing JSON fields fall back to the dimethoate defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GutsParams {
    #[serde(rename = "Type")]
    pub model: GutsModel,
    #[serde(rename = "T")]
    pub steps_per_day: u32,
    #[serde(rename = "K_SR")]
    pub k_sr: f64,
    #[serde(rename = "K_CA")]
    pub k_ca: f64,
    #[serde(rename = "Kd_SD")]
    pub kd_sd: f64,
    #[serde(rename = "Kd_IT")]
    pub kd_it: f64,
    #[serde(rename = "MW_SD")]
    pub mw_sd: f64,
    #[serde(rename = "BW_SD")]
    pub bw_sd: f64,
    #[serde(rename = "MW_IT")]
    pub mw_it: f64,
    #[serde(rename = "F_S")]
    pub f_s: f64,
}

impl Default for GutsParams {
    /// Dimethoate, Baas et al. 2022, converted to µg per bee.
    fn default() -> Self {
        Self {
            model: GutsModel::Sd,
            steps_per_day: 24,
            k_sr: 0.625,
            k_ca: 0.4,
            kd_sd: 0.36,
            kd_it: 0.012,
            mw_sd: 0.014,
            bw_sd: 21.0,
            mw_it: 0.0024,
            f_s: 3.0,
        }
    }
}

impl GutsParams {
    /// Substeps per day as a float divisor.
    ///
    /// Increments are divided by this rather than multiplied by `1 / T`, so
    /// results stay bit-identical with the reference recurrence.
    pub fn steps(&self) -> f64 {
        f64::from(self.steps_per_day)
    }

    /// Dominant rate constant for the given model.
    pub fn kd(&self, model: GutsModel) -> f64 {
        match model {
            GutsModel::Sd => self.kd_sd,
            GutsModel::It => self.kd_it,
        }
    }

    /// Validate every constraint; see `invariants::validate_params`.
    pub fn validate(&self) -> Result<(), crate::GutsError> {
        crate::invariants::validate_params(self)
    }
}

// ── Outcomes ──────────────────────────────────────────────────────

/// Result of one simulated day for one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DayOutcome {
    pub lethal: bool,
    pub state: ExposureState,
}

/// Result of one simulated day for an in-hive cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CohortOutcome {
    pub survivors: u64,
    pub oral_dose: f64,
    pub damage: f64,
}
