//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
//! Collaborator contracts.
//!
//! The supervisor works identically against simulated and hardware-backed
//! implementations of these traits. Wire formats (CAN frame decoding for the
//! BMS, Modbus register maps for the inverter) belong entirely to the
//! implementations; nothing here owns a protocol layout.
//!
//! Every method must return within a bounded time. A source that cannot
//! produce a fresh reading inside its own timeout surfaces the last-known
//! value or an error; it never hangs the control cycle.

use anyhow::Result;

use crate::telemetry::PackTelemetry;

/// Battery management subsystem seam: pack telemetry and alarm codes.
pub trait TelemetrySource: Send {
    /// Establish the transport. Idempotent; retried by the supervisor only
    /// through repeated `Init` entries, never internally.
    fn connect(&mut self) -> Result<()>;

    /// Most recent pack snapshot, or the last-known value on transient
    /// unavailability.
    fn read(&mut self) -> Result<PackTelemetry>;

    /// Active alarm codes, in the order the device reports them.
    fn alarms(&mut self) -> Result<Vec<String>>;
}

/// Grid-tied inverter seam: power setpoint, enable, and operator signals.
///
/// Writes are best-effort fire-and-forget within one cycle; the supervisor
/// does not wait for confirmation beyond the call returning.
pub trait ActuatorSink: Send {
    /// Establish the transport. Idempotent, same retry policy as the
    /// telemetry side.
    fn connect(&mut self) -> Result<()>;

    /// Command a power setpoint in watts (signed: positive is discharge).
    fn set_power(&mut self, watts: f64) -> Result<()>;

    /// Command the inverter on or off.
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Power currently requested by the operator-facing side.
    fn power_command(&mut self) -> Result<f64>;

    /// Whether an external fault-reset request is pending.
    fn reset_requested(&mut self) -> Result<bool>;
}
