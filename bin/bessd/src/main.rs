//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "binary"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Binary entrypoint for the BESS supervisor daemon."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use bess_api::{spawn_api_server, ApiServer, ApiState};
use bess_common::config::{AppConfig, Mode};
use bess_common::logging::init_tracing;
use bess_core::{StatusHandle, Supervisor, SupervisorRuntime};
use bess_sim::SimPlant;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "BESS supervisor daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Override application mode")]
    mode: Option<CliMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Simulation,
    Production,
}

impl From<CliMode> for Mode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Simulation => Mode::Simulation,
            CliMode::Production => Mode::Production,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the supervisor")]
    Run,
    #[command(about = "Load and validate the configuration, then exit")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/bessd.toml"));
    candidates.push(PathBuf::from("configs/example.dev.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_tracing("bessd", &config.logging)?;
            info!(config_path = %loaded.source.display(), mode = ?config.mode, "configuration loaded");
            run_daemon(config).await
        }
        Commands::CheckConfig => {
            println!(
                "{} OK (mode: {:?}, cycle period: {} ms)",
                loaded.source.display(),
                config.mode,
                config.control.cycle_period.as_millis()
            );
            Ok(())
        }
    }
}

async fn run_daemon(config: AppConfig) -> Result<()> {
    let plant = match config.mode {
        Mode::Simulation => SimPlant::from_config(&config.simulation),
        Mode::Production => {
            // Hardware decoding for the BMS CAN frames and the inverter
            // register map is an unresolved open question upstream; refusing
            // to start beats guessing a protocol layout.
            bail!("no hardware telemetry/actuator adapters are configured in this build; run with --mode simulation")
        }
    };

    let supervisor = Supervisor::new(
        config.limits,
        plant.bms.clone(),
        plant.inverter.clone(),
    );
    let status = StatusHandle::new();
    let runtime = SupervisorRuntime::spawn(supervisor, config.control.cycle_period, status.clone());

    let mut api_server: Option<ApiServer> = None;
    if config.api.enabled {
        let listen = config.api.listen;
        let state = Arc::new(ApiState::new(
            status,
            config.clone(),
            Some(Arc::new(plant.clone())),
        ));
        match spawn_api_server(state, listen) {
            Ok(server) => {
                api_server = Some(server);
            }
            Err(err) => {
                warn!(error = %err, "failed to start api server");
            }
        }
    } else {
        info!("api server disabled by configuration");
    }

    info!("daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    runtime.shutdown().await?;

    if let Some(server) = api_server {
        server.shutdown().await?;
    }

    Ok(())
}
