//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use bess_common::SafetyLimits;

use crate::fault::FaultCode;
use crate::telemetry::PackTelemetry;

/// Which code family a violated bound maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    /// Safety gate before power flow is allowed.
    Precheck,
    /// Continuous re-validation while power is flowing.
    Running,
}

/// Evaluate a telemetry sample against the configured interlock bounds.
///
/// Pure and total: no side effects, no panics, and NaN or otherwise
/// non-ordered telemetry is a violation rather than a silent pass. Checks run
/// in a fixed order (soc, voltage, temperature, then current while running)
/// and the first violation wins so fault codes stay deterministic across
/// runs.
///
/// All bounds are inclusive. Each comparison is written as a pass condition;
/// any comparison involving NaN evaluates false and therefore trips.
pub fn check_limits(
    data: &PackTelemetry,
    limits: &SafetyLimits,
    phase: CheckPhase,
) -> Result<(), FaultCode> {
    if !(data.soc >= limits.min_soc && data.soc <= limits.max_soc) {
        return Err(match phase {
            CheckPhase::Precheck => FaultCode::SocRange,
            CheckPhase::Running => FaultCode::SocLimit,
        });
    }

    if !(data.pack_voltage >= limits.min_pack_volt && data.pack_voltage <= limits.max_pack_volt) {
        return Err(match phase {
            CheckPhase::Precheck => FaultCode::VoltRange,
            CheckPhase::Running => FaultCode::VoltLimit,
        });
    }

    if !(data.max_temp_c <= limits.max_temp_c) {
        return Err(match phase {
            CheckPhase::Precheck => FaultCode::TempHigh,
            CheckPhase::Running => FaultCode::TempLimit,
        });
    }

    // Current is only validated while power is flowing; the precheck gate
    // covers soc, voltage, and temperature.
    if phase == CheckPhase::Running && !(data.pack_current_a.abs() <= limits.max_discharge_a) {
        return Err(FaultCode::CurrentLimit);
    }

    Ok(())
}
