//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
//! Supervisory controller for a battery energy storage unit.
//!
//! The [`Supervisor`] sequences connection, precondition checking, idle
//! standby, active power delivery, wind-down, and fault latching over the
//! [`TelemetrySource`] and [`ActuatorSink`] collaborator seams. Safety bounds
//! are re-validated on every cycle while power is flowing.

pub mod fault;
pub mod io;
pub mod runtime;
pub mod safety;
pub mod status;
pub mod supervisor;
pub mod telemetry;

pub use fault::{FaultCode, FaultRecord};
pub use io::{ActuatorSink, TelemetrySource};
pub use runtime::{SupervisorHandle, SupervisorRuntime};
pub use safety::{check_limits, CheckPhase};
pub use status::{StatusHandle, StatusSnapshot};
pub use supervisor::{Supervisor, SupervisorState};
pub use telemetry::PackTelemetry;
