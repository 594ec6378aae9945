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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine-readable fault codes surfaced to operators.
///
/// The precheck and running families deliberately use distinct codes for the
/// same physical bound: downstream diagnostics rely on telling "rejected
/// before start" apart from "tripped while active".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultCode {
    /// A collaborator could not be connected or read during `Init`.
    ConnectFail,
    /// The BMS raised its master alarm during `Init`.
    MasterAlarm,
    /// State of charge outside bounds at precheck.
    SocRange,
    /// State of charge outside bounds while running.
    SocLimit,
    /// Pack voltage outside bounds at precheck.
    VoltRange,
    /// Pack voltage outside bounds while running.
    VoltLimit,
    /// Pack temperature above bound at precheck.
    TempHigh,
    /// Pack temperature above bound while running.
    TempLimit,
    /// Discharge current magnitude above bound while running.
    CurrentLimit,
    /// The BMS raised its master alarm during wind-down.
    EndMasterAlarm,
}

impl FaultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCode::ConnectFail => "CONNECT_FAIL",
            FaultCode::MasterAlarm => "MASTER_ALARM",
            FaultCode::SocRange => "SOC_RANGE",
            FaultCode::SocLimit => "SOC_LIMIT",
            FaultCode::VoltRange => "VOLT_RANGE",
            FaultCode::VoltLimit => "VOLT_LIMIT",
            FaultCode::TempHigh => "TEMP_HIGH",
            FaultCode::TempLimit => "TEMP_LIMIT",
            FaultCode::CurrentLimit => "CURRENT_LIMIT",
            FaultCode::EndMasterAlarm => "END_MASTER_ALARM",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fault latched by the supervisor, cleared only on confirmed exit from the
/// `Fault` state via external reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub code: FaultCode,
    pub entered_at: DateTime<Utc>,
}

impl FaultRecord {
    pub fn now(code: FaultCode) -> Self {
        Self {
            code,
            entered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_to_operator_strings() {
        for (code, expected) in [
            (FaultCode::ConnectFail, "CONNECT_FAIL"),
            (FaultCode::MasterAlarm, "MASTER_ALARM"),
            (FaultCode::SocRange, "SOC_RANGE"),
            (FaultCode::SocLimit, "SOC_LIMIT"),
            (FaultCode::VoltRange, "VOLT_RANGE"),
            (FaultCode::VoltLimit, "VOLT_LIMIT"),
            (FaultCode::TempHigh, "TEMP_HIGH"),
            (FaultCode::TempLimit, "TEMP_LIMIT"),
            (FaultCode::CurrentLimit, "CURRENT_LIMIT"),
            (FaultCode::EndMasterAlarm, "END_MASTER_ALARM"),
        ] {
            assert_eq!(code.as_str(), expected);
            assert_eq!(
                serde_json::to_value(code).unwrap(),
                serde_json::Value::String(expected.to_owned())
            );
        }
    }
}
