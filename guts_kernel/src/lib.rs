#![forbid(unsafe_code)]

//! GUTS-RED survival kernel.
//!
//! Sub-daily integration of external dose decay and internal damage, with
//! the two death policies of the reduced General Unified Threshold model of
//! Survival: stochastic death (SD) and individual tolerance (IT).

/// Kernel v1. Any change to the numerical recurrence requires kernel_v2.
pub const KERNEL_VERSION: u32 = 1;

pub mod error;
pub mod domain;
pub mod state;
pub mod random;
pub mod integrator;
pub mod sd;
pub mod it;
pub mod threshold;
pub mod invariants;
pub mod exposure;
pub mod engine;
pub mod hashing;

pub use domain::{CohortOutcome, DayOutcome, DeathPolicy, GutsModel, GutsParams};
pub use error::GutsError;
pub use random::UniformSource;
pub use state::ExposureState;
