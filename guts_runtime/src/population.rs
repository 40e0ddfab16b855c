//! In-memory population of tracked individuals.
//!
//! Draws for individual `i` on day `d` come from a generator seeded by
//! `(run seed, i, d)`. A day's outcome is therefore a pure function of the
//! carried state and the day's intakes: processing order does not matter
//! and a restored snapshot continues exactly like the uninterrupted run.
//!
//! Apply-then-commit: `simulate_day` runs a day against a copy of the
//! population and hands it back; only `commit` replaces the live state.

use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use guts_kernel::engine::Individual;
use guts_kernel::exposure::{merge_states, DailyExposure};
use guts_kernel::hashing::canonical_hash_individuals;
use guts_kernel::random::{derive_seed, stream_rng};
use guts_kernel::threshold::ThresholdTable;
use guts_kernel::{ExposureState, GutsError};

use crate::config::{RunConfig, ThresholdSampling};
use crate::schedule::ExposureDay;
use crate::RuntimeError;

/// Population after `day` simulated days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationState {
    pub day: u64,
    pub individuals: BTreeMap<u64, Individual>,
}

impl PopulationState {
    pub fn alive(&self) -> u64 {
        self.individuals.values().filter(|i| i.is_alive()).count() as u64
    }

    /// Count-weighted pool of the living individuals' carried state, the
    /// mean exposure of the surviving population. `None` when nobody is
    /// alive.
    pub fn pooled_exposure(&self) -> Result<Option<ExposureState>, RuntimeError> {
        let mut pooled: Option<(u64, ExposureState)> = None;
        for ind in self.individuals.values().filter(|i| i.is_alive()) {
            pooled = Some(match pooled {
                None => (1, *ind.state()),
                Some((n, acc)) => (n + 1, merge_states(n, &acc, 1, ind.state())?),
            });
        }
        Ok(pooled.map(|(_, state)| state))
    }

    /// Canonical SHA-256 over every individual, sorted by id.
    pub fn hash(&self) -> String {
        canonical_hash_individuals(self.individuals.iter().map(|(id, ind)| (*id, ind)))
    }
}

/// Result of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: u64,
    pub alive: u64,
    /// Individuals whose death was recorded on this day, ascending.
    pub deaths: Vec<u64>,
}

/// Generator of individual `id` for `day`. Day 0 is reserved for the
/// draws made at creation (IT thresholds).
pub fn day_rng(seed: u64, id: u64, day: u64) -> ChaCha8Rng {
    stream_rng(derive_seed(seed, id), day)
}

#[derive(Debug)]
pub struct PopulationEngine {
    config: RunConfig,
    state: PopulationState,
}

impl PopulationEngine {
    /// Fresh unexposed population, ids `0..config.individuals`.
    ///
    /// A failed threshold draw is reported with the individual it belongs
    /// to.
    pub fn new(config: RunConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let table = match config.threshold_sampling {
            ThresholdSampling::Table { resolution } => {
                Some(ThresholdTable::build(&config.params, resolution)?)
            }
            ThresholdSampling::Direct => None,
        };

        let mut individuals = BTreeMap::new();
        for id in 0..config.individuals {
            let mut rng = day_rng(config.seed, id, 0);
            let ind = match &table {
                Some(table) => {
                    Individual::from_table(&config.params, config.death_policy, table, &mut rng)
                }
                None => Individual::new(&config.params, config.death_policy, &mut rng),
            }
            .map_err(|source| RuntimeError::ThresholdDraw {
                individual: id,
                source,
            })?;
            individuals.insert(id, ind);
        }
        info!(
            individuals = config.individuals,
            model = ?config.params.model,
            sampling = ?config.threshold_sampling,
            seed = config.seed,
            "population initialized"
        );
        Ok(Self {
            config,
            state: PopulationState {
                day: 0,
                individuals,
            },
        })
    }

    /// Resume from a previously captured state. The state must belong to
    /// this configuration.
    pub fn from_state(config: RunConfig, state: PopulationState) -> Result<Self, RuntimeError> {
        config.validate()?;
        validate_population(&config, &state)?;
        Ok(Self { config, state })
    }

    /// Simulate one day without touching the live state. Days must arrive
    /// as 1, 2, 3, ...
    ///
    /// Listed individuals receive their intake on top of the carried
    /// state; everyone else alive still decays and accumulates damage.
    /// Intakes addressed to dead individuals are dropped with a warning.
    pub fn simulate_day(
        &self,
        exposure: &ExposureDay,
    ) -> Result<(PopulationState, DaySummary), RuntimeError> {
        exposure.validate()?;
        let expected = self.state.day + 1;
        if exposure.day != expected {
            return Err(GutsError::DaySequence {
                expected,
                got: exposure.day,
            }
            .into());
        }
        let intakes = exposure.intake_map();
        if let Some(id) = intakes
            .keys()
            .find(|id| !self.state.individuals.contains_key(id))
        {
            return Err(RuntimeError::UnknownIndividual(*id));
        }

        let mut next = self.state.individuals.clone();
        let mut deaths = Vec::new();
        for (id, ind) in next.iter_mut() {
            let intake = intakes.get(id);
            if !ind.is_alive() {
                if intake.is_some() {
                    warn!(individual = *id, day = exposure.day, "intake for dead individual ignored");
                }
                continue;
            }
            let daily = match intake {
                Some(i) => DailyExposure::new(exposure.day, i.oral_dose, i.contact_dose),
                None => DailyExposure::none(exposure.day),
            };
            let mut rng = day_rng(self.config.seed, *id, exposure.day);
            let outcome = ind.apply_day(&daily, &self.config.params, &mut rng)?;
            if outcome.lethal {
                debug!(individual = *id, day = exposure.day, damage = outcome.state.damage, "death");
                deaths.push(*id);
            }
        }

        let next = PopulationState {
            day: exposure.day,
            individuals: next,
        };
        let summary = DaySummary {
            day: exposure.day,
            alive: next.alive(),
            deaths,
        };
        Ok((next, summary))
    }

    /// Install a state produced by `simulate_day` on the current one.
    pub fn commit(&mut self, next: PopulationState, summary: &DaySummary) {
        info!(day = summary.day, alive = summary.alive, deaths = summary.deaths.len(), "day simulated");
        self.state = next;
    }

    /// `simulate_day` followed by `commit`.
    pub fn advance_day(&mut self, exposure: &ExposureDay) -> Result<DaySummary, RuntimeError> {
        let (next, summary) = self.simulate_day(exposure)?;
        self.commit(next, &summary);
        Ok(summary)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> &PopulationState {
        &self.state
    }

    pub fn day(&self) -> u64 {
        self.state.day
    }

    pub fn state_hash(&self) -> String {
        self.state.hash()
    }
}

/// Structural checks on a population loaded from outside the engine.
pub fn validate_population(config: &RunConfig, state: &PopulationState) -> Result<(), RuntimeError> {
    if state.individuals.len() as u64 != config.individuals {
        return Err(RuntimeError::InvariantViolation(format!(
            "expected {} individuals, found {}",
            config.individuals,
            state.individuals.len()
        )));
    }
    for (id, ind) in &state.individuals {
        if *id >= config.individuals {
            return Err(RuntimeError::InvariantViolation(format!(
                "individual id {} outside 0..{}",
                id, config.individuals
            )));
        }
        if ind.model() != config.params.model {
            return Err(RuntimeError::InvariantViolation(format!(
                "individual {} uses {:?}, run uses {:?}",
                id,
                ind.model(),
                config.params.model
            )));
        }
        ind.validate()?;
        let in_step = match ind.died_on() {
            None => ind.last_day() == state.day,
            Some(_) => ind.last_day() <= state.day,
        };
        if !in_step {
            return Err(RuntimeError::InvariantViolation(format!(
                "individual {} at day {}, population at day {}",
                id,
                ind.last_day(),
                state.day
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Intake;
    use guts_kernel::domain::{GutsModel, GutsParams};

    fn config(model: GutsModel, n: u64) -> RunConfig {
        RunConfig::new(
            GutsParams {
                model,
                ..GutsParams::default()
            },
            42,
            n,
        )
    }

    fn dose_all(day: u64, n: u64, oral: f64) -> ExposureDay {
        ExposureDay::new(
            day,
            (0..n)
                .map(|individual| Intake {
                    individual,
                    oral_dose: oral,
                    contact_dose: 0.0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_new_population_is_alive_and_unexposed() {
        let pop = PopulationEngine::new(config(GutsModel::Sd, 5)).unwrap();
        assert_eq!(pop.state().alive(), 5);
        assert_eq!(pop.day(), 0);
        assert!(pop
            .state()
            .individuals
            .values()
            .all(|i| i.state().is_clear()));
    }

    #[test]
    fn test_it_thresholds_differ_between_individuals() {
        let pop = PopulationEngine::new(config(GutsModel::It, 4)).unwrap();
        let thresholds: Vec<f64> = pop
            .state()
            .individuals
            .values()
            .filter_map(|i| i.threshold())
            .collect();
        assert_eq!(thresholds.len(), 4);
        assert!(thresholds.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = PopulationEngine::new(config(GutsModel::Sd, 20)).unwrap();
        let mut b = PopulationEngine::new(config(GutsModel::Sd, 20)).unwrap();
        for day in 1..=5 {
            a.advance_day(&dose_all(day, 20, 0.05)).unwrap();
            b.advance_day(&dose_all(day, 20, 0.05)).unwrap();
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_unlisted_individuals_still_decay() {
        let mut pop = PopulationEngine::new(config(GutsModel::Sd, 2)).unwrap();
        let day1 = ExposureDay::new(
            1,
            vec![Intake {
                individual: 0,
                oral_dose: 0.01,
                contact_dose: 0.0,
            }],
        );
        pop.advance_day(&day1).unwrap();
        let dosed = pop.state().individuals[&0].state().oral_dose;
        pop.advance_day(&ExposureDay::new(2, Vec::new())).unwrap();
        let after = pop.state().individuals[&0].state().oral_dose;
        assert!(after < dosed);
        assert!(pop.state().individuals[&1].state().is_clear());
    }

    #[test]
    fn test_unknown_individual_rejected_without_change() {
        let mut pop = PopulationEngine::new(config(GutsModel::Sd, 2)).unwrap();
        let before = pop.state_hash();
        let err = pop.advance_day(&dose_all(1, 3, 0.1)).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownIndividual(2)));
        assert_eq!(pop.state_hash(), before);
        assert_eq!(pop.day(), 0);
    }

    #[test]
    fn test_day_gap_rejected() {
        let mut pop = PopulationEngine::new(config(GutsModel::Sd, 1)).unwrap();
        let err = pop.advance_day(&ExposureDay::new(2, Vec::new())).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Kernel(GutsError::DaySequence { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_lethal_dose_kills_and_later_intake_is_ignored() {
        let mut pop = PopulationEngine::new(config(GutsModel::Sd, 10)).unwrap();
        let summary = pop.advance_day(&dose_all(1, 10, 50.0)).unwrap();
        assert_eq!(summary.alive + summary.deaths.len() as u64, 10);
        assert!(!summary.deaths.is_empty());
        let next = pop.advance_day(&dose_all(2, 10, 1.0)).unwrap();
        for id in &summary.deaths {
            assert!(!next.deaths.contains(id));
            assert_eq!(pop.state().individuals[id].died_on(), Some(1));
        }
    }

    #[test]
    fn test_from_state_resumes_identically() {
        let cfg = config(GutsModel::Sd, 8);
        let mut full = PopulationEngine::new(cfg.clone()).unwrap();
        for day in 1..=3 {
            full.advance_day(&dose_all(day, 8, 0.05)).unwrap();
        }
        let mut resumed = PopulationEngine::from_state(cfg, full.state().clone()).unwrap();
        for day in 4..=6 {
            full.advance_day(&dose_all(day, 8, 0.05)).unwrap();
            resumed.advance_day(&dose_all(day, 8, 0.05)).unwrap();
        }
        assert_eq!(full.state_hash(), resumed.state_hash());
    }

    #[test]
    fn test_from_state_rejects_foreign_population() {
        let pop = PopulationEngine::new(config(GutsModel::Sd, 3)).unwrap();
        let err = PopulationEngine::from_state(config(GutsModel::Sd, 4), pop.state().clone())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvariantViolation(_)));
        let err = PopulationEngine::from_state(config(GutsModel::It, 3), pop.state().clone())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvariantViolation(_)));
    }

    #[test]
    fn test_simulate_day_leaves_live_state_untouched() {
        let mut pop = PopulationEngine::new(config(GutsModel::Sd, 6)).unwrap();
        let before = pop.state_hash();
        let (next, summary) = pop.simulate_day(&dose_all(1, 6, 0.05)).unwrap();
        assert_eq!(pop.day(), 0);
        assert_eq!(pop.state_hash(), before);
        assert_eq!(next.day, 1);

        let mut direct = PopulationEngine::new(config(GutsModel::Sd, 6)).unwrap();
        assert_eq!(direct.advance_day(&dose_all(1, 6, 0.05)).unwrap(), summary);
        pop.commit(next, &summary);
        assert_eq!(pop.state_hash(), direct.state_hash());
    }

    #[test]
    fn test_table_sampling_assigns_table_cells() {
        let mut cfg = config(GutsModel::It, 30);
        cfg.threshold_sampling = ThresholdSampling::Table { resolution: 8 };
        let table = ThresholdTable::build(&cfg.params, 8).unwrap();
        let pop = PopulationEngine::new(cfg).unwrap();
        for ind in pop.state().individuals.values() {
            let t = ind.threshold().unwrap();
            assert!(table.entries().contains(&t));
        }
        let direct = PopulationEngine::new(config(GutsModel::It, 30)).unwrap();
        assert_ne!(pop.state_hash(), direct.state_hash());
    }

    #[test]
    fn test_failed_threshold_draw_names_individual() {
        let mut cfg = config(GutsModel::It, 50);
        cfg.params.mw_it = 0.99;
        cfg.params.f_s = 1.000_01;
        match PopulationEngine::new(cfg) {
            Err(RuntimeError::ThresholdDraw { individual, source }) => {
                assert!(individual < 50);
                assert!(source.is_invalid_parameter());
            }
            other => panic!("expected a threshold draw failure, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_pooled_exposure_averages_survivors() {
        let mut pop = PopulationEngine::new(config(GutsModel::Sd, 3)).unwrap();
        assert_eq!(
            pop.state().pooled_exposure().unwrap(),
            Some(ExposureState::unexposed())
        );
        let day1 = ExposureDay::new(
            1,
            vec![Intake {
                individual: 0,
                oral_dose: 0.003,
                contact_dose: 0.0,
            }],
        );
        pop.advance_day(&day1).unwrap();
        assert_eq!(pop.state().alive(), 3);
        let pooled = pop.state().pooled_exposure().unwrap().unwrap();
        let dosed = pop.state().individuals[&0].state().oral_dose;
        assert!((pooled.oral_dose - dosed / 3.0).abs() < 1e-15);
    }
}
