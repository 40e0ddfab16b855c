//! Session manager: isolated runs with persist-after-apply semantics.
//!
//! Each run gets its own directory with an exposure log and snapshots.
//! Concurrency: Mutex for write serialization, no global mutable state.
//!
//! Apply, persist, then commit:
//!   1. population.simulate_day(day)  may fail; nothing is written then
//!   2. exposure_log.append(day)      may fail; the population is unchanged
//!   3. population.commit(next)
//!   4. snapshot if interval reached

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::exposure_log::ExposureLog;
use crate::population::{DaySummary, PopulationEngine, PopulationState};
use crate::replay;
use crate::schedule::ExposureDay;
use crate::snapshot;
use crate::RuntimeError;

/// An isolated simulation run with its own log and population.
pub struct Session {
    run_id: String,
    run_dir: PathBuf,
    population: PopulationEngine,
    log: ExposureLog,
}

impl Session {
    /// Open (or create) a run under `base_dir`.
    ///
    /// Directory structure:
    ///   <base_dir>/<run_id>/exposures.log
    ///   <base_dir>/<run_id>/snapshots/
    ///
    /// An existing log is replayed, starting from the latest snapshot
    /// that verifies.
    pub fn open(base_dir: &Path, run_id: &str, config: RunConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let run_dir = base_dir.join(run_id);
        let log = ExposureLog::open(&run_dir.join("exposures.log"))?;

        let population = if log.last_day() > 0 {
            let days = log.load()?;
            let base = latest_valid_snapshot(&run_dir.join("snapshots"), &config, log.last_day());
            let (state, _) = match base {
                Some(state) => replay::rebuild_from(&config, state, &days)?,
                None => replay::rebuild_state(&config, &days)?,
            };
            info!(run_id, day = state.day, "session restored");
            PopulationEngine::from_state(config, state)?
        } else {
            PopulationEngine::new(config)?
        };

        Ok(Self {
            run_id: run_id.to_string(),
            run_dir,
            population,
            log,
        })
    }

    /// Simulate and persist one day.
    pub fn apply_day(&mut self, day: &ExposureDay) -> Result<DaySummary, RuntimeError> {
        let (next, summary) = self.population.simulate_day(day)?;
        self.log.append(day)?;
        self.population.commit(next, &summary);

        let interval = self.population.config().snapshot_interval;
        if interval > 0 && day.day % interval == 0 {
            snapshot::save_snapshot(&self.snapshot_dir(), self.population.state())?;
        }

        Ok(summary)
    }

    /// Reset and rebuild the population from the full log, ignoring
    /// snapshots.
    pub fn replay_full(&mut self) -> Result<(PopulationState, String), RuntimeError> {
        let days = self.log.load()?;
        let config = self.population.config().clone();
        let (state, hash) = replay::rebuild_state(&config, &days)?;
        self.population = PopulationEngine::from_state(config, state.clone())?;
        Ok((state, hash))
    }

    /// All days recorded for this run.
    pub fn recorded_days(&self) -> Result<Vec<ExposureDay>, RuntimeError> {
        self.log.load()
    }

    pub fn state(&self) -> &PopulationState {
        self.population.state()
    }

    pub fn current_hash(&self) -> String {
        self.population.state_hash()
    }

    pub fn current_day(&self) -> u64 {
        self.population.day()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.run_dir.join("snapshots")
    }
}

/// Latest snapshot that restores cleanly and is not ahead of the log.
fn latest_valid_snapshot(dir: &Path, config: &RunConfig, last_day: u64) -> Option<PopulationState> {
    let snap = match snapshot::load_latest_snapshot(dir) {
        Ok(Some(snap)) => snap,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "unreadable snapshot, replaying from day 1");
            return None;
        }
    };
    if snap.day > last_day {
        warn!(snapshot_day = snap.day, last_day, "snapshot ahead of log, ignored");
        return None;
    }
    match snapshot::restore_snapshot(config, &snap) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(day = snap.day, error = %e, "snapshot rejected, replaying from day 1");
            None
        }
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Apply a day under lock.
    pub fn apply_day(&self, day: &ExposureDay) -> Result<DaySummary, RuntimeError> {
        self.lock()?.apply_day(day)
    }

    pub fn current_hash(&self) -> Result<String, RuntimeError> {
        Ok(self.lock()?.current_hash())
    }

    pub fn current_day(&self) -> Result<u64, RuntimeError> {
        Ok(self.lock()?.current_day())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Session>, RuntimeError> {
        self.inner
            .lock()
            .map_err(|_| RuntimeError::InvariantViolation("session lock poisoned".to_string()))
    }
}
