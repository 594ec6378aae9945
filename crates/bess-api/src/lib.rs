//! ---
//! bess_section: "05-networking-external-interfaces"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Operator-facing status facade for the supervisor."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
//! REST status surface for the BESS supervisor.
//!
//! Strictly read-only with respect to the controller: state, fault record,
//! and telemetry arrive through the lock-guarded snapshot channel, never by
//! touching the supervisor directly. The `/api/sim/*` endpoints act on the
//! simulated plant, standing in for an operator at the real hardware.

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bess_common::AppConfig;
use bess_core::{PackTelemetry, StatusHandle};
use bess_sim::SimControl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared API state exposed to handlers.
pub struct ApiState {
    status: StatusHandle,
    config: AppConfig,
    start: Instant,
    simulation: Option<Arc<dyn SimControl>>,
}

impl ApiState {
    pub fn new(
        status: StatusHandle,
        config: AppConfig,
        simulation: Option<Arc<dyn SimControl>>,
    ) -> Self {
        Self {
            status,
            config,
            start: Instant::now(),
            simulation,
        }
    }

    fn status(&self) -> StatusResponse {
        let snapshot = self.status.read();
        StatusResponse {
            state: snapshot.state.as_str(),
            last_fault: snapshot.last_fault.map(|record| record.code.as_str()),
            fault_entered_at: snapshot.last_fault.map(|record| record.entered_at),
            telemetry: snapshot.telemetry,
            updated_at: snapshot.updated_at,
            uptime_seconds: self.start.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn simulation(&self) -> Option<Arc<dyn SimControl>> {
        self.simulation.as_ref().map(Arc::clone)
    }
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("config", &self.config.mode)
            .finish_non_exhaustive()
    }
}

/// Handle to the running API server.
#[derive(Debug)]
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ApiServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(err.into()),
        }
    }
}

/// Spawn the REST facade.
pub fn spawn_api_server(state: Arc<ApiState>, addr: SocketAddr) -> Result<ApiServer> {
    let router = Router::new()
        .route("/api/status", get(get_status))
        .route("/api/config", get(get_config))
        .route("/api/sim/power", post(post_sim_power))
        .route("/api/sim/reset", post(post_sim_reset))
        .route("/api/sim/alarm", post(post_sim_alarm))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind API listener {addr}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to configure API listener as non-blocking")?;
    let tcp_listener =
        TcpListener::from_std(listener).context("failed to create tokio listener")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        info!(address = %addr, "api server listening");
        if let Err(err) = axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            error!(address = %addr, error = %err, "api server exited with error");
            return Err(err.into());
        }
        Ok(())
    });

    Ok(ApiServer {
        addr,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    state: &'static str,
    last_fault: Option<&'static str>,
    fault_entered_at: Option<DateTime<Utc>>,
    telemetry: Option<PackTelemetry>,
    updated_at: DateTime<Utc>,
    uptime_seconds: u64,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct SimAck {
    applied: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn simulation_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "simulation control unavailable",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

async fn get_status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(state.status())
}

async fn get_config(State(state): State<Arc<ApiState>>) -> Json<AppConfig> {
    Json(state.config.clone())
}

#[derive(Debug, Deserialize)]
struct SimPowerRequest {
    watts: f64,
}

async fn post_sim_power(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SimPowerRequest>,
) -> Result<(StatusCode, Json<SimAck>), ApiError> {
    let simulation = state
        .simulation()
        .ok_or_else(ApiError::simulation_unavailable)?;
    simulation.set_power_command(request.watts);
    Ok((StatusCode::ACCEPTED, Json(SimAck { applied: true })))
}

async fn post_sim_reset(
    State(state): State<Arc<ApiState>>,
) -> Result<(StatusCode, Json<SimAck>), ApiError> {
    let simulation = state
        .simulation()
        .ok_or_else(ApiError::simulation_unavailable)?;
    simulation.request_reset();
    Ok((StatusCode::ACCEPTED, Json(SimAck { applied: true })))
}

#[derive(Debug, Deserialize)]
struct SimAlarmRequest {
    active: bool,
}

async fn post_sim_alarm(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SimAlarmRequest>,
) -> Result<(StatusCode, Json<SimAck>), ApiError> {
    let simulation = state
        .simulation()
        .ok_or_else(ApiError::simulation_unavailable)?;
    simulation.set_master_alarm(request.active);
    Ok((StatusCode::ACCEPTED, Json(SimAck { applied: true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bess_core::{ActuatorSink, StatusSnapshot, SupervisorState};
    use bess_sim::SimPlant;

    fn state_with_plant() -> (Arc<ApiState>, SimPlant, StatusHandle) {
        let status = StatusHandle::new();
        let plant = SimPlant::default();
        let state = Arc::new(ApiState::new(
            status.clone(),
            AppConfig::default(),
            Some(Arc::new(plant.clone())),
        ));
        (state, plant, status)
    }

    #[tokio::test]
    async fn status_reports_the_published_snapshot() {
        let (state, _plant, status) = state_with_plant();
        status.publish(StatusSnapshot {
            state: SupervisorState::Running,
            last_fault: None,
            telemetry: Some(PackTelemetry::nominal()),
            updated_at: Utc::now(),
        });

        let Json(response) = get_status(State(state)).await;
        assert_eq!(response.state, "running");
        assert_eq!(response.last_fault, None);
        assert!(response.telemetry.is_some());

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["state"], "running");
        assert!(body["last_fault"].is_null());
        assert_eq!(body["telemetry"]["soc"], 50.0);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn sim_power_endpoint_sets_the_operator_command() {
        let (state, plant, _status) = state_with_plant();
        let (code, Json(ack)) = post_sim_power(
            State(state),
            Json(SimPowerRequest { watts: 150.0 }),
        )
        .await
        .unwrap();
        assert_eq!(code, StatusCode::ACCEPTED);
        assert!(ack.applied);

        let mut inverter = plant.inverter.clone();
        assert_eq!(inverter.power_command().unwrap(), 150.0);
    }

    #[tokio::test]
    async fn sim_endpoints_require_simulation_mode() {
        let state = Arc::new(ApiState::new(
            StatusHandle::new(),
            AppConfig::default(),
            None,
        ));
        let err = post_sim_reset(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
