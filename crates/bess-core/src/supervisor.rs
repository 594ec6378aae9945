//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::fmt;

use bess_common::SafetyLimits;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fault::{FaultCode, FaultRecord};
use crate::io::{ActuatorSink, TelemetrySource};
use crate::safety::{check_limits, CheckPhase};
use crate::status::StatusSnapshot;
use crate::telemetry::PackTelemetry;

/// Supervisor control states. `Init` is the start state; `Fault` latches
/// until an external reset and is reachable from every other state. There is
/// no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    Init,
    Precheck,
    Idle,
    Running,
    EndCycle,
    Fault,
}

impl SupervisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::Init => "init",
            SupervisorState::Precheck => "precheck",
            SupervisorState::Idle => "idle",
            SupervisorState::Running => "running",
            SupervisorState::EndCycle => "end_cycle",
            SupervisorState::Fault => "fault",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finite-state supervisory controller for one battery energy storage unit.
///
/// Owns both collaborators for its lifetime and is the sole mutator of its
/// state: exactly one transition happens per [`step`](Supervisor::step), and
/// `step` never returns an error. Collaborator I/O failures are folded into
/// the `CONNECT_FAIL` fault during `Init` and into a last-known-value
/// fallback everywhere else.
#[derive(Debug)]
pub struct Supervisor<T, A> {
    limits: SafetyLimits,
    bms: T,
    inverter: A,
    state: SupervisorState,
    fault: Option<FaultRecord>,
    last_telemetry: Option<PackTelemetry>,
    last_power_command: f64,
}

impl<T, A> Supervisor<T, A>
where
    T: TelemetrySource,
    A: ActuatorSink,
{
    pub fn new(limits: SafetyLimits, bms: T, inverter: A) -> Self {
        Self {
            limits,
            bms,
            inverter,
            state: SupervisorState::Init,
            fault: None,
            last_telemetry: None,
            last_power_command: 0.0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Code of the latched fault, if the current or most recently exited
    /// state was `Fault`.
    pub fn last_fault(&self) -> Option<FaultCode> {
        self.fault.map(|record| record.code)
    }

    pub fn fault_record(&self) -> Option<FaultRecord> {
        self.fault
    }

    pub fn last_telemetry(&self) -> Option<PackTelemetry> {
        self.last_telemetry
    }

    /// Read-only view published to the status facade after every cycle.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            last_fault: self.fault,
            telemetry: self.last_telemetry,
            updated_at: Utc::now(),
        }
    }

    /// Drive one control cycle: at most one state transition plus the
    /// side-effecting commands appropriate to the current state.
    pub fn step(&mut self) -> SupervisorState {
        match self.state {
            SupervisorState::Init => self.state_init(),
            SupervisorState::Precheck => self.state_precheck(),
            SupervisorState::Idle => self.state_idle(),
            SupervisorState::Running => self.state_running(),
            SupervisorState::EndCycle => self.state_end_cycle(),
            SupervisorState::Fault => self.state_fault(),
        }
        self.state
    }

    fn state_init(&mut self) {
        if let Err(err) = self.bms.connect() {
            warn!(error = %err, "bms connect failed");
            return self.trip(FaultCode::ConnectFail);
        }
        if let Err(err) = self.inverter.connect() {
            warn!(error = %err, "inverter connect failed");
            return self.trip(FaultCode::ConnectFail);
        }
        if let Err(err) = self.inverter.set_enabled(true) {
            warn!(error = %err, "inverter on command failed");
            return self.trip(FaultCode::ConnectFail);
        }

        let data = match self.bms.read() {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "initial telemetry read failed");
                return self.trip(FaultCode::ConnectFail);
            }
        };
        self.last_telemetry = Some(data);

        match self.bms.alarms() {
            Ok(alarms) if !alarms.is_empty() => {
                info!(?alarms, "active bms alarm codes at startup")
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "bms alarm poll failed"),
        }

        if data.master_alarm {
            return self.trip(FaultCode::MasterAlarm);
        }
        self.transition(SupervisorState::Idle);
    }

    fn state_precheck(&mut self) {
        let Some(data) = self.read_telemetry() else {
            return;
        };
        if let Err(code) = check_limits(&data, &self.limits, CheckPhase::Precheck) {
            return self.trip(code);
        }
        self.transition(SupervisorState::Running);
    }

    fn state_idle(&mut self) {
        // Standby: wait for a non-zero operator power command, then gate it
        // through the safety prechecks.
        let command = self.read_power_command();
        if command != 0.0 {
            self.transition(SupervisorState::Precheck);
        }
    }

    fn state_running(&mut self) {
        let Some(data) = self.read_telemetry() else {
            return;
        };
        let command = self.read_power_command();

        if command == 0.0 {
            return self.transition(SupervisorState::EndCycle);
        }

        // On violation the setpoint is withheld this cycle; the fault state
        // takes over commanding from the next cycle on.
        if let Err(code) = check_limits(&data, &self.limits, CheckPhase::Running) {
            return self.trip(code);
        }

        if let Err(err) = self.inverter.set_power(command) {
            warn!(error = %err, watts = command, "power setpoint write failed");
        }
    }

    fn state_end_cycle(&mut self) {
        let Some(data) = self.read_telemetry() else {
            return;
        };
        if data.master_alarm {
            return self.trip(FaultCode::EndMasterAlarm);
        }
        if let Err(err) = self.inverter.set_power(0.0) {
            warn!(error = %err, "zero setpoint command failed");
        }
        self.transition(SupervisorState::Idle);
    }

    fn state_fault(&mut self) {
        // Re-commanded every cycle without change detection: the actuator may
        // not persist commands between cycles.
        if let Err(err) = self.inverter.set_enabled(false) {
            warn!(error = %err, "inverter off command failed");
        }
        if let Err(err) = self.inverter.set_power(0.0) {
            warn!(error = %err, "zero setpoint command failed");
        }

        match self.inverter.reset_requested() {
            Ok(true) => {
                info!(cleared = ?self.fault.map(|record| record.code), "external reset acknowledged");
                self.fault = None;
                self.transition(SupervisorState::Init);
            }
            Ok(false) => {}
            Err(err) => warn!(error = %err, "reset request poll failed"),
        }
    }

    /// Fetch a fresh telemetry sample, falling back to the last-known sample
    /// on a transient read failure. Returns `None` only when no sample has
    /// ever been read, which trips `CONNECT_FAIL`.
    fn read_telemetry(&mut self) -> Option<PackTelemetry> {
        match self.bms.read() {
            Ok(data) => {
                self.last_telemetry = Some(data);
                Some(data)
            }
            Err(err) => {
                warn!(error = %err, "telemetry read failed; using last-known sample");
                if self.last_telemetry.is_none() {
                    self.trip(FaultCode::ConnectFail);
                }
                self.last_telemetry
            }
        }
    }

    fn read_power_command(&mut self) -> f64 {
        match self.inverter.power_command() {
            Ok(watts) => {
                self.last_power_command = watts;
                watts
            }
            Err(err) => {
                warn!(error = %err, "power command read failed; using last-known value");
                self.last_power_command
            }
        }
    }

    fn trip(&mut self, code: FaultCode) {
        warn!(code = %code, from = %self.state, "safety fault latched");
        self.fault = Some(FaultRecord::now(code));
        self.state = SupervisorState::Fault;
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}
