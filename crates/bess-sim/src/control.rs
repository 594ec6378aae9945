//! ---
//! bess_section: "11-simulation-test-harness"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Simulated collaborator implementations and control surface."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use bess_common::SimulationConfig;
use bess_core::PackTelemetry;

use crate::bms::SimBms;
use crate::inverter::SimInverter;

/// Operator-style control surface over the simulated plant, consumed by the
/// HTTP facade. Mirrors what a human would do at the real hardware: change
/// the commanded power, push the reset button, raise the master alarm.
pub trait SimControl: Send + Sync {
    fn set_power_command(&self, watts: f64);
    fn request_reset(&self);
    fn set_master_alarm(&self, active: bool);
}

/// The simulated pack plus inverter, seeded from configuration.
#[derive(Debug, Clone, Default)]
pub struct SimPlant {
    pub bms: SimBms,
    pub inverter: SimInverter,
}

impl SimPlant {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let bms = SimBms::new(PackTelemetry {
            soc: config.soc,
            pack_voltage: config.pack_voltage,
            max_temp_c: config.max_temp_c,
            pack_current_a: config.pack_current_a,
            master_alarm: config.master_alarm,
        });
        bms.set_alarms(config.alarms.clone());
        let inverter = SimInverter::new();
        inverter.set_power_command(config.power_command_w);
        Self { bms, inverter }
    }
}

impl SimControl for SimPlant {
    fn set_power_command(&self, watts: f64) {
        self.inverter.set_power_command(watts);
    }

    fn request_reset(&self) {
        self.inverter.request_reset();
    }

    fn set_master_alarm(&self, active: bool) {
        self.bms.set_master_alarm(active);
    }
}
