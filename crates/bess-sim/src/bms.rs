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
use bess_core::{PackTelemetry, TelemetrySource};
use parking_lot::Mutex;

#[derive(Debug)]
struct BmsShared {
    telemetry: PackTelemetry,
    alarms: Vec<String>,
    fail_connect: bool,
    fail_reads: bool,
    connects: u32,
}

/// Simulated battery management subsystem.
///
/// Clones share state, so a test or the API facade can keep one clone for
/// scripting while the supervisor owns another.
#[derive(Debug, Clone)]
pub struct SimBms {
    shared: Arc<Mutex<BmsShared>>,
}

impl SimBms {
    pub fn new(seed: PackTelemetry) -> Self {
        Self {
            shared: Arc::new(Mutex::new(BmsShared {
                telemetry: seed,
                alarms: Vec::new(),
                fail_connect: false,
                fail_reads: false,
                connects: 0,
            })),
        }
    }

    pub fn set_telemetry(&self, telemetry: PackTelemetry) {
        self.shared.lock().telemetry = telemetry;
    }

    /// Mutate the current sample in place, e.g. to drift one field.
    pub fn update<F: FnOnce(&mut PackTelemetry)>(&self, apply: F) {
        apply(&mut self.shared.lock().telemetry);
    }

    pub fn set_master_alarm(&self, active: bool) {
        self.shared.lock().telemetry.master_alarm = active;
    }

    pub fn set_alarms(&self, codes: Vec<String>) {
        self.shared.lock().alarms = codes;
    }

    /// Make subsequent `connect()` calls fail, simulating a dead bus.
    pub fn fail_connects(&self, fail: bool) {
        self.shared.lock().fail_connect = fail;
    }

    /// Make subsequent `read()` calls fail, simulating transient loss.
    pub fn fail_reads(&self, fail: bool) {
        self.shared.lock().fail_reads = fail;
    }

    pub fn connect_count(&self) -> u32 {
        self.shared.lock().connects
    }
}

impl Default for SimBms {
    fn default() -> Self {
        Self::new(PackTelemetry::nominal())
    }
}

impl TelemetrySource for SimBms {
    fn connect(&mut self) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.fail_connect {
            bail!("simulated bms connect failure");
        }
        shared.connects += 1;
        Ok(())
    }

    fn read(&mut self) -> Result<PackTelemetry> {
        let shared = self.shared.lock();
        if shared.fail_reads {
            bail!("simulated bms read failure");
        }
        Ok(shared.telemetry)
    }

    fn alarms(&mut self) -> Result<Vec<String>> {
        Ok(self.shared.lock().alarms.clone())
    }
}
