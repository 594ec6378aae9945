//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::Result;
use bess_common::time::jitter_us;
use bess_rt::RateLimiter;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::io::{ActuatorSink, TelemetrySource};
use crate::status::StatusHandle;
use crate::supervisor::Supervisor;

/// Fixed-period cycle driver owning a [`Supervisor`] for its lifetime.
///
/// The supervisor is single-threaded and cooperative: exactly one `step()`
/// executes per tick, on this task, with no mid-cycle cancellation. Shutdown
/// lands between cycles.
#[derive(Debug)]
pub struct SupervisorRuntime;

impl SupervisorRuntime {
    /// Spawn the cycle loop. The returned handle exposes the read-only status
    /// channel and an async shutdown.
    pub fn spawn<T, A>(
        mut supervisor: Supervisor<T, A>,
        period: Duration,
        status: StatusHandle,
    ) -> SupervisorHandle
    where
        T: TelemetrySource + 'static,
        A: ActuatorSink + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(4);
        let loop_status = status.clone();

        let task = tokio::spawn(async move {
            let mut limiter = RateLimiter::new(period);
            let mut cycle: u64 = 0;
            let mut last_tick: Option<Instant> = None;

            info!(period_ms = period.as_millis() as u64, "supervisor cycle loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("supervisor shutdown signal received");
                        break;
                    }
                    tick = limiter.tick() => {
                        cycle += 1;
                        let previous = supervisor.state();
                        let next = supervisor.step();
                        loop_status.publish(supervisor.snapshot());

                        if next != previous {
                            info!(
                                cycle,
                                from = %previous,
                                to = %next,
                                fault = supervisor.last_fault().map(|code| code.as_str()),
                                "supervisor transition"
                            );
                        }
                        if let Some(previous_tick) = last_tick {
                            debug!(
                                cycle,
                                state = %next,
                                jitter_us = jitter_us(tick.duration_since(previous_tick), period),
                                "supervisor cycle"
                            );
                        }
                        last_tick = Some(tick);
                    }
                }
            }
            info!(cycle, "supervisor cycle loop stopped");
        });

        SupervisorHandle {
            shutdown: shutdown_tx,
            task,
            status,
        }
    }
}

/// Handle returned from [`SupervisorRuntime::spawn`].
#[derive(Debug)]
pub struct SupervisorHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
    status: StatusHandle,
}

impl SupervisorHandle {
    /// Read-only snapshot channel fed once per cycle.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Stop the loop after the in-flight cycle completes.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            error!(error = %err, "supervisor task join error");
            return Err(err.into());
        }
        Ok(())
    }
}
