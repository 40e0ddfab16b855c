//! Hand-written protobuf types for the exposure log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Doses are `double`, so values survive the log bit-for-bit.

use prost::Message;

// ── Intake ─────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoIntake {
    #[prost(uint64, tag = "1")]
    pub individual: u64,
    #[prost(double, tag = "2")]
    pub oral_dose: f64,
    #[prost(double, tag = "3")]
    pub contact_dose: f64,
}

// ── Exposure day ───────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoExposureDay {
    #[prost(uint64, tag = "1")]
    pub day: u64,
    #[prost(message, repeated, tag = "2")]
    pub intakes: Vec<ProtoIntake>,
    /// Kernel version that consumed this day.
    #[prost(uint32, tag = "3")]
    pub kernel_version: u32,
}
