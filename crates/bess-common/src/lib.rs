//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Shared primitives and utilities for the supervisor runtime."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
//! Shared primitives for the BESS supervisor workspace.
//! This crate exposes configuration loading, logging, and time helpers
//! consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    ApiConfig, AppConfig, ConfigError, ControlConfig, LoggingConfig, Mode, SafetyLimits,
    SimulationConfig,
};
pub use logging::{init_tracing, LogFormat};
