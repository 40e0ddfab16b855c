//! Run configuration.
//!
//! One JSON document per experiment variant: the GUTS parameter set plus
//! the few host settings a reproducible run needs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use guts_kernel::domain::{DeathPolicy, GutsParams};
use guts_kernel::threshold::DEFAULT_TABLE_RESOLUTION;

use crate::RuntimeError;

/// How IT individuals get their lifetime threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdSampling {
    /// Transform each individual's draw directly.
    #[default]
    Direct,
    /// Look the draw up in a table of `resolution` precomputed cells, as
    /// the colony model does.
    Table {
        #[serde(default = "default_resolution")]
        resolution: usize,
    },
}

fn default_resolution() -> usize {
    DEFAULT_TABLE_RESOLUTION
}

/// Settings for one simulated experiment variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// GUTS constants and model selection (`Type`: "SD" or "IT").
    #[serde(default)]
    pub params: GutsParams,
    /// SD behaviour after the first lethal draw of a day.
    #[serde(default)]
    pub death_policy: DeathPolicy,
    /// Ignored by SD runs.
    #[serde(default)]
    pub threshold_sampling: ThresholdSampling,
    /// Run seed. Individual `i` draws from stream `(seed, i, day)`.
    pub seed: u64,
    /// Number of tracked individuals, ids `0..individuals`.
    pub individuals: u64,
    /// Auto-snapshot every N days; 0 disables snapshots.
    #[serde(default)]
    pub snapshot_interval: u64,
}

impl RunConfig {
    pub fn new(params: GutsParams, seed: u64, individuals: u64) -> Self {
        Self {
            params,
            death_policy: DeathPolicy::default(),
            threshold_sampling: ThresholdSampling::default(),
            seed,
            individuals,
            snapshot_interval: 0,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, RuntimeError> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        self.params.validate()?;
        if self.individuals == 0 {
            return Err(RuntimeError::Config(
                "individuals must be at least 1".to_string(),
            ));
        }
        if self.threshold_sampling == (ThresholdSampling::Table { resolution: 0 }) {
            return Err(RuntimeError::Config(
                "threshold table needs at least one cell".to_string(),
            ));
        }
        Ok(())
    }
}
