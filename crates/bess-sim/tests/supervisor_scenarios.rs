//! ---
//! bess_section: "11-simulation-test-harness"
//! bess_subsection: "module"
//! bess_type: "source"
//! bess_scope: "code"
//! bess_description: "End-to-end supervisor scenarios against the simulated plant."
//! bess_version: "v0.0.0-prealpha"
//! bess_owner: "tbd"
//! ---
use std::time::Duration;

use bess_common::SafetyLimits;
use bess_core::{
    FaultCode, PackTelemetry, StatusHandle, Supervisor, SupervisorRuntime, SupervisorState,
};
use bess_sim::{SimBms, SimControl, SimInverter, SimPlant};

fn limits() -> SafetyLimits {
    SafetyLimits {
        min_soc: 20.0,
        max_soc: 90.0,
        min_pack_volt: 320.0,
        max_pack_volt: 532.0,
        max_temp_c: 40.0,
        max_discharge_a: 250.0,
    }
}

fn plant() -> (SimBms, SimInverter, Supervisor<SimBms, SimInverter>) {
    let bms = SimBms::new(PackTelemetry::nominal());
    let inverter = SimInverter::new();
    let supervisor = Supervisor::new(limits(), bms.clone(), inverter.clone());
    (bms, inverter, supervisor)
}

/// Drive to `Running` with the given operator power command.
fn run_up(
    inverter: &SimInverter,
    supervisor: &mut Supervisor<SimBms, SimInverter>,
    watts: f64,
) {
    inverter.set_power_command(watts);
    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(supervisor.step(), SupervisorState::Precheck);
    assert_eq!(supervisor.step(), SupervisorState::Running);
}

#[test]
fn nominal_startup_reaches_idle_in_two_steps_without_fault() {
    let (_bms, inverter, mut supervisor) = plant();

    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(supervisor.last_fault(), None);
    // Init commanded the inverter on exactly once.
    assert_eq!(inverter.enable_commands(), vec![true]);
}

#[test]
fn master_alarm_at_startup_faults_before_idle() {
    let (bms, _inverter, mut supervisor) = plant();
    bms.set_master_alarm(true);

    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::MasterAlarm));
}

#[test]
fn connect_failure_faults_and_reset_retries_connection() {
    let (bms, inverter, mut supervisor) = plant();
    bms.fail_connects(true);

    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::ConnectFail));

    // Recovery is externally triggered: clear the cause, push reset, and the
    // next Init entry re-runs the connection sequence.
    bms.fail_connects(false);
    inverter.request_reset();
    assert_eq!(supervisor.step(), SupervisorState::Init);
    assert_eq!(supervisor.last_fault(), None);
    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(bms.connect_count(), 1);
}

#[test]
fn zero_power_command_never_leaves_idle() {
    let (_bms, inverter, mut supervisor) = plant();
    inverter.set_power_command(0.0);

    assert_eq!(supervisor.step(), SupervisorState::Idle);
    for _ in 0..10 {
        assert_eq!(supervisor.step(), SupervisorState::Idle);
    }
    assert!(inverter.setpoints().is_empty());
}

#[test]
fn nonzero_power_command_gates_through_precheck() {
    let (_bms, inverter, mut supervisor) = plant();

    assert_eq!(supervisor.step(), SupervisorState::Idle);
    inverter.set_power_command(100.0);
    assert_eq!(supervisor.step(), SupervisorState::Precheck);
    assert_eq!(supervisor.step(), SupervisorState::Running);
    // The setpoint is only forwarded once Running executes a cycle.
    assert!(inverter.setpoints().is_empty());
    assert_eq!(supervisor.step(), SupervisorState::Running);
    assert_eq!(inverter.last_setpoint(), Some(100.0));
}

#[test]
fn soc_out_of_range_is_rejected_at_precheck() {
    let (bms, inverter, mut supervisor) = plant();
    bms.update(|telemetry| telemetry.soc = 95.0);
    inverter.set_power_command(100.0);

    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(supervisor.step(), SupervisorState::Precheck);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::SocRange));
    assert!(inverter.setpoints().is_empty());
}

#[test]
fn running_violation_trips_next_step_and_withholds_the_setpoint() {
    let (bms, inverter, mut supervisor) = plant();
    run_up(&inverter, &mut supervisor, 100.0);

    assert_eq!(supervisor.step(), SupervisorState::Running);
    let forwarded = inverter.setpoints().len();

    bms.update(|telemetry| telemetry.max_temp_c = 55.0);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::TempLimit));
    // The violating cycle forwarded nothing.
    assert_eq!(inverter.setpoints().len(), forwarded);
}

#[test]
fn over_current_pack_passes_precheck_and_trips_on_the_first_running_cycle() {
    let (bms, inverter, mut supervisor) = plant();
    bms.update(|telemetry| telemetry.pack_current_a = 300.0);
    inverter.set_power_command(100.0);

    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(supervisor.step(), SupervisorState::Precheck);
    // Current is not a precheck gate; the pack reaches Running first.
    assert_eq!(supervisor.step(), SupervisorState::Running);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::CurrentLimit));
    assert!(inverter.setpoints().is_empty());
}

#[test]
fn over_current_while_running_reports_current_limit() {
    let (bms, inverter, mut supervisor) = plant();
    run_up(&inverter, &mut supervisor, 100.0);

    bms.update(|telemetry| telemetry.pack_current_a = -300.0);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::CurrentLimit));
}

#[test]
fn fault_latches_and_recommands_off_and_zero_every_cycle() {
    let (bms, inverter, mut supervisor) = plant();
    bms.set_master_alarm(true);
    assert_eq!(supervisor.step(), SupervisorState::Fault);

    let baseline_enables = inverter.enable_commands().len();
    let baseline_setpoints = inverter.setpoints().len();
    for cycle in 1..=5 {
        assert_eq!(supervisor.step(), SupervisorState::Fault);
        let enables = inverter.enable_commands();
        let setpoints = inverter.setpoints();
        assert_eq!(enables.len(), baseline_enables + cycle);
        assert_eq!(enables.last(), Some(&false));
        assert_eq!(setpoints.len(), baseline_setpoints + cycle);
        assert_eq!(setpoints.last(), Some(&0.0));
    }
    // Latched: the alarm clearing alone does not unlatch the fault.
    bms.set_master_alarm(false);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::MasterAlarm));
}

#[test]
fn reset_clears_the_fault_record_and_returns_to_init() {
    let (bms, inverter, mut supervisor) = plant();
    bms.set_master_alarm(true);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::MasterAlarm));

    bms.set_master_alarm(false);
    inverter.request_reset();
    assert_eq!(supervisor.step(), SupervisorState::Init);
    assert_eq!(supervisor.last_fault(), None);
    assert_eq!(supervisor.step(), SupervisorState::Idle);
}

#[test]
fn wind_down_passes_through_end_cycle_and_zeroes_power() {
    let (_bms, inverter, mut supervisor) = plant();
    run_up(&inverter, &mut supervisor, 100.0);
    assert_eq!(supervisor.step(), SupervisorState::Running);
    assert_eq!(inverter.last_setpoint(), Some(100.0));

    inverter.set_power_command(0.0);
    assert_eq!(supervisor.step(), SupervisorState::EndCycle);
    assert_eq!(supervisor.step(), SupervisorState::Idle);
    assert_eq!(inverter.last_setpoint(), Some(0.0));
    assert_eq!(supervisor.last_fault(), None);
}

#[test]
fn master_alarm_during_wind_down_faults_with_end_code() {
    let (bms, inverter, mut supervisor) = plant();
    run_up(&inverter, &mut supervisor, 100.0);

    inverter.set_power_command(0.0);
    assert_eq!(supervisor.step(), SupervisorState::EndCycle);
    bms.set_master_alarm(true);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::EndMasterAlarm));
}

#[test]
fn transient_read_failures_fall_back_to_the_last_known_sample() {
    let (bms, inverter, mut supervisor) = plant();
    run_up(&inverter, &mut supervisor, 100.0);
    assert_eq!(supervisor.step(), SupervisorState::Running);

    bms.fail_reads(true);
    assert_eq!(supervisor.step(), SupervisorState::Running);
    assert_eq!(supervisor.last_fault(), None);
    assert_eq!(inverter.last_setpoint(), Some(100.0));

    bms.fail_reads(false);
    assert_eq!(supervisor.step(), SupervisorState::Running);
}

#[test]
fn plant_control_surface_drives_the_same_shared_state() {
    let plant = SimPlant::default();
    let mut supervisor = Supervisor::new(
        limits(),
        plant.bms.clone(),
        plant.inverter.clone(),
    );

    assert_eq!(supervisor.step(), SupervisorState::Idle);
    plant.set_power_command(250.0);
    assert_eq!(supervisor.step(), SupervisorState::Precheck);

    plant.set_master_alarm(true);
    assert_eq!(supervisor.step(), SupervisorState::Running);
    // Master alarm is not a running check; wind down first, then it trips.
    plant.set_power_command(0.0);
    assert_eq!(supervisor.step(), SupervisorState::EndCycle);
    assert_eq!(supervisor.step(), SupervisorState::Fault);
    assert_eq!(supervisor.last_fault(), Some(FaultCode::EndMasterAlarm));

    plant.set_master_alarm(false);
    plant.request_reset();
    assert_eq!(supervisor.step(), SupervisorState::Init);
    assert_eq!(supervisor.last_fault(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runtime_publishes_snapshots_and_shuts_down_cleanly() {
    let plant = SimPlant::default();
    let supervisor = Supervisor::new(
        limits(),
        plant.bms.clone(),
        plant.inverter.clone(),
    );
    let handle = SupervisorRuntime::spawn(
        supervisor,
        Duration::from_millis(10),
        StatusHandle::new(),
    );

    let status = handle.status();
    let mut reached_idle = false;
    for _ in 0..50 {
        if status.read().state == SupervisorState::Idle {
            reached_idle = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(reached_idle, "expected the runtime to publish Idle");

    let snapshot = status.read();
    assert!(snapshot.telemetry.is_some());
    assert!(snapshot.last_fault.is_none());

    handle.shutdown().await.unwrap();
}
