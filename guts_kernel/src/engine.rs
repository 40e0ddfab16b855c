/// GUTS kernel: per-individual tracker
///
/// Stateful wrapper around the pure day kernels. Owns one individual's
/// carried exposure state and, for IT, its lifetime threshold.
///
/// Strict day sequence, no exposure after death.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DayOutcome, DeathPolicy, GutsModel, GutsParams};
use crate::exposure::DailyExposure;
use crate::invariants::{validate_positive, validate_state};
use crate::it::simulate_it;
use crate::random::UniformSource;
use crate::sd::simulate_sd;
use crate::state::ExposureState;
use crate::threshold::{draw_threshold, ThresholdTable};
use crate::GutsError;

/// One exposed individual across its simulated lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Individual {
    model: GutsModel,
    policy: DeathPolicy,
    state: ExposureState,
    threshold: Option<f64>,
    last_day: u64,
    died_on: Option<u64>,
}

impl Individual {
    /// Create an unexposed individual using the parameter set's model.
    ///
    /// IT individuals draw their threshold from `rng` here, once.
    pub fn new<R: UniformSource + ?Sized>(
        params: &GutsParams,
        policy: DeathPolicy,
        rng: &mut R,
    ) -> Result<Self, GutsError> {
        params.validate()?;
        let threshold = match params.model {
            GutsModel::It => {
                let t = draw_threshold(rng, params)?;
                debug!(threshold = t, "sampled IT threshold");
                Some(t)
            }
            GutsModel::Sd => None,
        };
        Ok(Self::unexposed(params.model, policy, threshold))
    }

    /// Like `new`, but IT thresholds are looked up in a precomputed
    /// table (one draw, one cell). SD individuals draw nothing.
    pub fn from_table<R: UniformSource + ?Sized>(
        params: &GutsParams,
        policy: DeathPolicy,
        table: &ThresholdTable,
        rng: &mut R,
    ) -> Result<Self, GutsError> {
        params.validate()?;
        let threshold = match params.model {
            GutsModel::It => {
                let t = table.lookup(rng.next_uniform())?;
                debug!(threshold = t, "IT threshold from table");
                Some(t)
            }
            GutsModel::Sd => None,
        };
        Ok(Self::unexposed(params.model, policy, threshold))
    }

    fn unexposed(model: GutsModel, policy: DeathPolicy, threshold: Option<f64>) -> Self {
        Self {
            model,
            policy,
            state: ExposureState::unexposed(),
            threshold,
            last_day: 0,
            died_on: None,
        }
    }

    /// IT individual with a known threshold (pooled or restored).
    pub fn with_threshold(threshold: f64, state: ExposureState) -> Result<Self, GutsError> {
        validate_positive("threshold", threshold)?;
        validate_state(&state)?;
        Ok(Self {
            model: GutsModel::It,
            policy: DeathPolicy::default(),
            state,
            threshold: Some(threshold),
            last_day: 0,
            died_on: None,
        })
    }

    /// Apply one day: add the intake, run the model's kernel, store the
    /// returned state. Days must arrive as 1, 2, 3, ...
    pub fn apply_day<R: UniformSource + ?Sized>(
        &mut self,
        exposure: &DailyExposure,
        params: &GutsParams,
        rng: &mut R,
    ) -> Result<DayOutcome, GutsError> {
        if let Some(day) = self.died_on {
            return Err(GutsError::DeadIndividual { day });
        }
        let expected = self.last_day + 1;
        if exposure.day != expected {
            return Err(GutsError::DaySequence {
                expected,
                got: exposure.day,
            });
        }
        exposure.validate()?;

        let input = self
            .state
            .with_intake(exposure.oral_dose, exposure.contact_dose);
        let outcome = match self.model {
            GutsModel::Sd => simulate_sd(input, params, rng, self.policy)?,
            GutsModel::It => {
                let threshold = self.threshold.ok_or(GutsError::MissingThreshold)?;
                simulate_it(threshold, input, params)?
            }
        };

        self.state = outcome.state;
        self.last_day = exposure.day;
        if outcome.lethal {
            debug!(day = exposure.day, damage = outcome.state.damage, "individual died");
            self.died_on = Some(exposure.day);
        }
        Ok(outcome)
    }

    /// Consistency of a deserialized individual: valid carried state, a
    /// positive threshold exactly when the model is IT, death no later
    /// than the last simulated day.
    pub fn validate(&self) -> Result<(), GutsError> {
        validate_state(&self.state)?;
        match (self.model, self.threshold) {
            (GutsModel::It, Some(t)) => validate_positive("threshold", t)?,
            (GutsModel::It, None) => return Err(GutsError::MissingThreshold),
            (GutsModel::Sd, Some(t)) => {
                return Err(GutsError::invalid(
                    "threshold",
                    t,
                    "SD individuals carry no threshold",
                ))
            }
            (GutsModel::Sd, None) => {}
        }
        if let Some(day) = self.died_on {
            if day == 0 || day > self.last_day {
                return Err(GutsError::DaySequence {
                    expected: self.last_day,
                    got: day,
                });
            }
        }
        Ok(())
    }

    pub fn model(&self) -> GutsModel {
        self.model
    }

    pub fn policy(&self) -> DeathPolicy {
        self.policy
    }

    pub fn state(&self) -> &ExposureState {
        &self.state
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn last_day(&self) -> u64 {
        self.last_day
    }

    pub fn died_on(&self) -> Option<u64> {
        self.died_on
    }

    pub fn is_alive(&self) -> bool {
        self.died_on.is_none()
    }
}
