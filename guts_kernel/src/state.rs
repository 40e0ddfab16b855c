/// GUTS kernel: per-individual exposure state
///
/// Value type. Passed into a kernel call and returned from it; the host
/// stores it back onto its own record between days.

use serde::{Deserialize, Serialize};

/// External residues and internal damage of one individual.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExposureState {
    /// Residual oral dose (µg).
    pub oral_dose: f64,
    /// Residual contact dose (µg).
    pub contact_dose: f64,
    /// Scaled internal damage `Ci`. Never negative.
    pub damage: f64,
}

impl ExposureState {
    pub fn new(oral_dose: f64, contact_dose: f64, damage: f64) -> Self {
        Self {
            oral_dose,
            contact_dose,
            damage,
        }
    }

    /// No residues, no damage.
    pub fn unexposed() -> Self {
        Self::default()
    }

    /// Add the day's newly received external doses to the carried residues.
    pub fn with_intake(self, oral: f64, contact: f64) -> Self {
        Self {
            oral_dose: self.oral_dose + oral,
            contact_dose: self.contact_dose + contact,
            damage: self.damage,
        }
    }

    /// Combined external dose driving damage.
    pub fn external_dose(&self) -> f64 {
        self.oral_dose + self.contact_dose
    }

    /// True when there is nothing left to integrate.
    pub fn is_clear(&self) -> bool {
        self.oral_dose == 0.0 && self.contact_dose == 0.0 && self.damage == 0.0
    }
}
