//! ---
//! bess_section: "11-simulation-test-harness"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Simulated collaborator implementations and control surface."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
//! In-memory collaborators for the BESS supervisor.
//!
//! `SimBms` and `SimInverter` satisfy the core collaborator traits with
//! shared, scriptable state so tests and the simulation-mode daemon can
//! inject telemetry, operator commands, and transport failures without any
//! bus driver.

pub mod bms;
pub mod control;
pub mod inverter;

pub use bms::SimBms;
pub use control::{SimControl, SimPlant};
pub use inverter::SimInverter;
