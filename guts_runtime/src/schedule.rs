//! Exposure schedules: which individual receives how much on which day.
//!
//! Produced upstream (foraging and consumption models). The runtime only
//! checks shape and feeds each day to the population.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use guts_kernel::invariants::validate_non_negative;

use crate::RuntimeError;

/// New external intake of one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Intake {
    pub individual: u64,
    #[serde(default)]
    pub oral_dose: f64,
    #[serde(default)]
    pub contact_dose: f64,
}

/// All intakes of one simulated day. Individuals not listed receive
/// nothing new.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExposureDay {
    pub day: u64,
    #[serde(default)]
    pub intakes: Vec<Intake>,
}

impl ExposureDay {
    pub fn new(day: u64, intakes: Vec<Intake>) -> Self {
        Self { day, intakes }
    }

    /// Intakes keyed by individual. On a duplicate id the later entry
    /// wins; `validate` rejects duplicates.
    pub fn intake_map(&self) -> BTreeMap<u64, &Intake> {
        self.intakes.iter().map(|i| (i.individual, i)).collect()
    }

    /// Day >= 1, at most one intake per individual, finite non-negative
    /// doses.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.day == 0 {
            return Err(RuntimeError::Schedule("days start at 1".to_string()));
        }
        let mut seen = BTreeMap::new();
        for intake in &self.intakes {
            if seen.insert(intake.individual, intake).is_some() {
                return Err(RuntimeError::Schedule(format!(
                    "day {}: individual {} listed twice",
                    self.day, intake.individual
                )));
            }
            validate_non_negative("oral_dose", intake.oral_dose)?;
            validate_non_negative("contact_dose", intake.contact_dose)?;
        }
        Ok(())
    }
}

/// Load a JSON array of exposure days. Days must run 1, 2, 3, ...
pub fn load_schedule(path: &Path) -> Result<Vec<ExposureDay>, RuntimeError> {
    let content = fs::read_to_string(path)?;
    let days: Vec<ExposureDay> = serde_json::from_str(&content)?;
    for (idx, day) in days.iter().enumerate() {
        let expected = idx as u64 + 1;
        if day.day != expected {
            return Err(RuntimeError::Schedule(format!(
                "expected day {}, found day {}",
                expected, day.day
            )));
        }
        day.validate()?;
    }
    Ok(days)
}
