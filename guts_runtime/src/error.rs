//! Runtime error type.

use std::io;

use guts_kernel::GutsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("kernel rejected input: {0}")]
    Kernel(#[from] GutsError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid exposure schedule: {0}")]
    Schedule(String),

    #[error("threshold for individual {individual} could not be sampled: {source}")]
    ThresholdDraw {
        individual: u64,
        #[source]
        source: GutsError,
    },

    #[error("corrupt exposure log at byte {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },

    #[error("exposure for unknown individual {0}")]
    UnknownIndividual(u64),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("determinism failure: run1={run1} run2={run2}")]
    Determinism { run1: String, run2: String },
}
