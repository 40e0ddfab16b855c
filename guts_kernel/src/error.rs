//! Kernel error type.

use thiserror::Error;

/// Every way a kernel call can be rejected.
///
/// All of these are caller programming errors. Integration itself is total
/// once its inputs have been validated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GutsError {
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("individual died on day {day} and cannot receive further exposure")]
    DeadIndividual { day: u64 },

    #[error("day sequence violation: expected day {expected}, got {got}")]
    DaySequence { expected: u64, got: u64 },

    #[error("IT model requires a sampled threshold but the individual has none")]
    MissingThreshold,
}

impl GutsError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        GutsError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// True for the `InvalidParameter` class.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, GutsError::InvalidParameter { .. })
    }
}
