#![forbid(unsafe_code)]

//! GUTS runtime.
//!
//! Hosts the kernel for reproducible experiments: run configuration,
//! a population of tracked individuals, an append-only protobuf exposure
//! log, replay, snapshots and drift comparison between variants.
//!
//! No toxicokinetics live here. Every day of every individual is delegated
//! to `guts_kernel`.

pub mod error;
pub mod config;
pub mod schedule;
pub mod proto_types;
pub mod proto_bridge;
pub mod exposure_log;
pub mod population;
pub mod replay;
pub mod snapshot;
pub mod session;
pub mod drift;

pub use error::RuntimeError;
