//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Shared primitives and utilities for the supervisor runtime."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;
use tracing::debug;

use crate::logging::LogFormat;

fn default_mode() -> Mode {
    Mode::Simulation
}

fn default_cycle_period() -> Duration {
    Duration::from_millis(100)
}

fn default_min_soc() -> f64 {
    20.0
}

fn default_max_soc() -> f64 {
    90.0
}

fn default_min_pack_volt() -> f64 {
    320.0
}

fn default_max_pack_volt() -> f64 {
    532.0
}

fn default_max_temp_c() -> f64 {
    40.0
}

fn default_max_discharge_a() -> f64 {
    250.0
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_listen() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default api address")
}

fn default_sim_soc() -> f64 {
    50.0
}

fn default_sim_pack_voltage() -> f64 {
    400.0
}

fn default_sim_max_temp_c() -> f64 {
    25.0
}

/// Validation failures raised when a configuration file is structurally
/// sound but semantically unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("limit '{0}' must be a finite number")]
    NonFiniteLimit(&'static str),
    #[error("limit '{0}' must be greater than zero")]
    NonPositiveLimit(&'static str),
    #[error("limit range '{0}' is inverted (min >= max)")]
    InvertedRange(&'static str),
    #[error("control cycle period must be non-zero")]
    ZeroCyclePeriod,
}

/// Primary configuration object for the supervisor daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    #[serde(default)]
    pub limits: SafetyLimits,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "BESSD_CONFIG";

    /// Load configuration from disk, respecting the `BESSD_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        self.control.validate()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            limits: SafetyLimits::default(),
            control: ControlConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Operating mode for the daemon.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Drive the supervisor against in-memory collaborator fakes.
    #[default]
    Simulation,
    /// Drive the supervisor against hardware-backed collaborators.
    Production,
}

impl Mode {
    pub fn is_simulation(&self) -> bool {
        matches!(self, Mode::Simulation)
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulation" => Ok(Mode::Simulation),
            "production" => Ok(Mode::Production),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Hard interlock bounds applied by the supervisor every cycle.
///
/// Constructed once at startup from configuration and shared read-only; the
/// controller never mutates these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyLimits {
    #[serde(default = "default_min_soc")]
    pub min_soc: f64,
    #[serde(default = "default_max_soc")]
    pub max_soc: f64,
    #[serde(default = "default_min_pack_volt")]
    pub min_pack_volt: f64,
    #[serde(default = "default_max_pack_volt")]
    pub max_pack_volt: f64,
    #[serde(default = "default_max_temp_c")]
    pub max_temp_c: f64,
    #[serde(default = "default_max_discharge_a")]
    pub max_discharge_a: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            min_soc: default_min_soc(),
            max_soc: default_max_soc(),
            min_pack_volt: default_min_pack_volt(),
            max_pack_volt: default_max_pack_volt(),
            max_temp_c: default_max_temp_c(),
            max_discharge_a: default_max_discharge_a(),
        }
    }
}

impl SafetyLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("min_soc", self.min_soc),
            ("max_soc", self.max_soc),
            ("min_pack_volt", self.min_pack_volt),
            ("max_pack_volt", self.max_pack_volt),
            ("max_temp_c", self.max_temp_c),
            ("max_discharge_a", self.max_discharge_a),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteLimit(name));
            }
        }
        if self.min_pack_volt <= 0.0 {
            return Err(ConfigError::NonPositiveLimit("min_pack_volt"));
        }
        if self.max_discharge_a <= 0.0 {
            return Err(ConfigError::NonPositiveLimit("max_discharge_a"));
        }
        if self.min_soc >= self.max_soc {
            return Err(ConfigError::InvertedRange("soc"));
        }
        if self.min_pack_volt >= self.max_pack_volt {
            return Err(ConfigError::InvertedRange("pack_volt"));
        }
        Ok(())
    }
}

/// Cycle-driver settings.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Fixed period between `step()` invocations. A tunable, not a
    /// correctness requirement.
    #[serde(default = "default_cycle_period", rename = "cycle_period_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub cycle_period: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_period: default_cycle_period(),
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_period.is_zero() {
            return Err(ConfigError::ZeroCyclePeriod);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_listen")]
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            listen: default_api_listen(),
        }
    }
}

/// Seed values for the simulated pack and inverter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_sim_soc")]
    pub soc: f64,
    #[serde(default = "default_sim_pack_voltage")]
    pub pack_voltage: f64,
    #[serde(default = "default_sim_max_temp_c")]
    pub max_temp_c: f64,
    #[serde(default)]
    pub pack_current_a: f64,
    #[serde(default)]
    pub master_alarm: bool,
    #[serde(default)]
    pub power_command_w: f64,
    #[serde(default)]
    pub alarms: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            soc: default_sim_soc(),
            pack_voltage: default_sim_pack_voltage(),
            max_temp_c: default_sim_max_temp_c(),
            pack_current_a: 0.0,
            master_alarm: false,
            power_command_w: 0.0,
            alarms: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn parses_minimal_toml() {
        let config: AppConfig = "mode = \"simulation\"\n".parse().unwrap();
        assert!(config.mode.is_simulation());
        assert_eq!(config.limits.min_soc, 20.0);
        assert_eq!(config.control.cycle_period, Duration::from_millis(100));
    }

    #[test]
    fn parses_limits_and_period() {
        let raw = r#"
            mode = "production"

            [limits]
            min_soc = 10.0
            max_soc = 95.0

            [control]
            cycle_period_ms = 250
        "#;
        let config: AppConfig = raw.parse().unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.limits.min_soc, 10.0);
        assert_eq!(config.limits.max_soc, 95.0);
        assert_eq!(config.control.cycle_period, Duration::from_millis(250));
    }

    #[test]
    fn rejects_inverted_soc_range() {
        let raw = r#"
            [limits]
            min_soc = 90.0
            max_soc = 20.0
        "#;
        let err = raw.parse::<AppConfig>().unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn rejects_non_finite_limit() {
        let limits = SafetyLimits {
            max_temp_c: f64::NAN,
            ..SafetyLimits::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(ConfigError::NonFiniteLimit("max_temp_c"))
        ));
    }

    #[test]
    fn rejects_zero_cycle_period() {
        let control = ControlConfig {
            cycle_period: Duration::ZERO,
        };
        assert!(matches!(
            control.validate(),
            Err(ConfigError::ZeroCyclePeriod)
        ));
    }

    #[test]
    fn load_prefers_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bessd.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "mode = \"simulation\"").unwrap();

        let missing = dir.path().join("missing.toml");
        let loaded = AppConfig::load_with_source(&[missing, path.clone()]).unwrap();
        assert_eq!(loaded.source, path);
    }
}
