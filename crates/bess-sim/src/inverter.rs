//! ---
//! bess_section: "11-simulation-test-harness"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Simulated collaborator implementations and control surface."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{bail, Result};
use bess_core::ActuatorSink;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct InverterShared {
    power_command: f64,
    reset_request: bool,
    enabled: Option<bool>,
    setpoints: Vec<f64>,
    enable_commands: Vec<bool>,
    fail_connect: bool,
    connects: u32,
}

/// Simulated grid-tied inverter.
///
/// The operator-facing side (power command register, reset request) is
/// scripted through the same shared handle the supervisor commands against.
/// All commands received from the supervisor are recorded for assertions.
#[derive(Debug, Clone, Default)]
pub struct SimInverter {
    shared: Arc<Mutex<InverterShared>>,
}

impl SimInverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator side: request a power setpoint in watts.
    pub fn set_power_command(&self, watts: f64) {
        self.shared.lock().power_command = watts;
    }

    /// Operator side: raise the external fault-reset request. Latched until
    /// the supervisor polls it.
    pub fn request_reset(&self) {
        self.shared.lock().reset_request = true;
    }

    /// Make subsequent `connect()` calls fail.
    pub fn fail_connects(&self, fail: bool) {
        self.shared.lock().fail_connect = fail;
    }

    pub fn connect_count(&self) -> u32 {
        self.shared.lock().connects
    }

    /// Last on/off command received, if any.
    pub fn enabled(&self) -> Option<bool> {
        self.shared.lock().enabled
    }

    /// Every on/off command received, in order.
    pub fn enable_commands(&self) -> Vec<bool> {
        self.shared.lock().enable_commands.clone()
    }

    /// Last power setpoint received, if any.
    pub fn last_setpoint(&self) -> Option<f64> {
        self.shared.lock().setpoints.last().copied()
    }

    /// Every power setpoint received, in order.
    pub fn setpoints(&self) -> Vec<f64> {
        self.shared.lock().setpoints.clone()
    }
}

impl ActuatorSink for SimInverter {
    fn connect(&mut self) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.fail_connect {
            bail!("simulated inverter connect failure");
        }
        shared.connects += 1;
        Ok(())
    }

    fn set_power(&mut self, watts: f64) -> Result<()> {
        self.shared.lock().setpoints.push(watts);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut shared = self.shared.lock();
        shared.enabled = Some(enabled);
        shared.enable_commands.push(enabled);
        Ok(())
    }

    fn power_command(&mut self) -> Result<f64> {
        Ok(self.shared.lock().power_command)
    }

    fn reset_requested(&mut self) -> Result<bool> {
        // One-shot: the request clears once acknowledged, like a self-resetting
        // pushbutton register.
        let mut shared = self.shared.lock();
        Ok(std::mem::take(&mut shared.reset_request))
    }
}
