//! ---
//! bess_section: "01-core-functionality"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "Supervisory state machine and safety interlock logic."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::fault::FaultRecord;
use crate::supervisor::SupervisorState;
use crate::telemetry::PackTelemetry;

/// Read-only view of the supervisor published once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: SupervisorState,
    pub last_fault: Option<FaultRecord>,
    pub telemetry: Option<PackTelemetry>,
    pub updated_at: DateTime<Utc>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            state: SupervisorState::Init,
            last_fault: None,
            telemetry: None,
            updated_at: Utc::now(),
        }
    }
}

/// Synchronized snapshot channel between the cycle driver and any
/// status-reporting facade.
///
/// The driver is the only writer; facades running on other tasks get a
/// lock-guarded copy and can never mutate controller state through it.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        *self.inner.write() = snapshot;
    }

    pub fn read(&self) -> StatusSnapshot {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultCode, FaultRecord};

    #[test]
    fn publish_replaces_the_snapshot() {
        let handle = StatusHandle::new();
        assert_eq!(handle.read().state, SupervisorState::Init);

        handle.publish(StatusSnapshot {
            state: SupervisorState::Fault,
            last_fault: Some(FaultRecord::now(FaultCode::TempLimit)),
            telemetry: Some(PackTelemetry::nominal()),
            updated_at: Utc::now(),
        });

        let snapshot = handle.read();
        assert_eq!(snapshot.state, SupervisorState::Fault);
        assert_eq!(
            snapshot.last_fault.map(|record| record.code),
            Some(FaultCode::TempLimit)
        );
    }

    #[test]
    fn snapshot_serializes_operator_facing_names() {
        let snapshot = StatusSnapshot {
            state: SupervisorState::Running,
            last_fault: None,
            telemetry: None,
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(value["state"], "running");
        assert!(value["last_fault"].is_null());
    }
}
