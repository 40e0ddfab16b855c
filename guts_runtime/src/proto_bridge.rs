//! Proto ↔ schedule conversion.

use guts_kernel::KERNEL_VERSION;

use crate::proto_types::{ProtoExposureDay, ProtoIntake};
use crate::schedule::{ExposureDay, Intake};
use crate::RuntimeError;

pub fn day_to_proto(day: &ExposureDay) -> ProtoExposureDay {
    ProtoExposureDay {
        day: day.day,
        intakes: day
            .intakes
            .iter()
            .map(|i| ProtoIntake {
                individual: i.individual,
                oral_dose: i.oral_dose,
                contact_dose: i.contact_dose,
            })
            .collect(),
        kernel_version: KERNEL_VERSION,
    }
}

/// Rejects days recorded by a different kernel version; replaying them
/// through this kernel would not reproduce the original run.
pub fn proto_to_day(proto: &ProtoExposureDay) -> Result<ExposureDay, RuntimeError> {
    if proto.kernel_version != KERNEL_VERSION {
        return Err(RuntimeError::Schedule(format!(
            "day {} was recorded by kernel v{}, this is kernel v{}",
            proto.day, proto.kernel_version, KERNEL_VERSION
        )));
    }
    Ok(ExposureDay {
        day: proto.day,
        intakes: proto
            .intakes
            .iter()
            .map(|i| Intake {
                individual: i.individual,
                oral_dose: i.oral_dose,
                contact_dose: i.contact_dose,
            })
            .collect(),
    })
}
