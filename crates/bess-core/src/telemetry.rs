//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of battery pack state as reported by the BMS.
///
/// A fresh instance is fetched every control cycle and never persisted; the
/// supervisor only retains the most recent sample as a stale-data fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackTelemetry {
    /// State of charge in percent (0-100 for a healthy pack).
    pub soc: f64,
    /// Pack terminal voltage in volts.
    pub pack_voltage: f64,
    /// Hottest cell/module temperature in degrees Celsius.
    pub max_temp_c: f64,
    /// Pack current in amps, signed: positive is discharge.
    pub pack_current_a: f64,
    /// Master alarm flag raised by the BMS itself.
    pub master_alarm: bool,
}

impl PackTelemetry {
    /// Nominal mid-range sample, handy as a simulation seed.
    pub fn nominal() -> Self {
        Self {
            soc: 50.0,
            pack_voltage: 400.0,
            max_temp_c: 25.0,
            pack_current_a: 0.0,
            master_alarm: false,
        }
    }
}
