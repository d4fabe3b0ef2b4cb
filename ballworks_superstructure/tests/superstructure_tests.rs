//! Integration tests for the superstructure coordinator.
//!
//! These exercise the full coordinator against the recording sim
//! subsystems: transition-edge semantics, issue-once setpoint discipline,
//! sensor-driven auto-advance, the stop path, and cross-thread command
//! safety.

use std::sync::Arc;
use std::thread;

use ballworks_common::config::{PolicyConfig, SetpointConfig, ShootPauseCompare};
use ballworks_common::state::{
    CarryHeight, IntakeState, MechanismState, PickUpHeight, ShootHeight, SystemState,
};
use ballworks_superstructure::looper::Loop;
use ballworks_superstructure::subsystems::sim::{SimIntake, SimMechanism};
use ballworks_superstructure::superstructure::Superstructure;

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    superstructure: Arc<Superstructure>,
    lift: Arc<SimMechanism>,
    wrist: Arc<SimMechanism>,
    intake: Arc<SimIntake>,
    setpoints: SetpointConfig,
}

fn harness_with_policy(policy: PolicyConfig) -> Harness {
    let lift = Arc::new(SimMechanism::new("lift"));
    let wrist = Arc::new(SimMechanism::new("wrist"));
    let intake = Arc::new(SimIntake::new());
    let setpoints = SetpointConfig::default();
    let superstructure = Arc::new(Superstructure::new(
        lift.clone(),
        wrist.clone(),
        intake.clone(),
        setpoints,
        policy,
    ));
    Harness {
        superstructure,
        lift,
        wrist,
        intake,
        setpoints,
    }
}

fn harness() -> Harness {
    harness_with_policy(PolicyConfig::default())
}

/// Tick `n` times with timestamps advancing by 10 ms from `start`.
fn tick_n(h: &Harness, start: f64, n: u32) -> f64 {
    let mut t = start;
    for _ in 0..n {
        t += 0.01;
        h.superstructure.on_loop(t);
    }
    t
}

// ── Transition-edge flag ────────────────────────────────────────────

#[test]
fn transition_flag_true_on_exactly_first_tick() {
    let h = harness();
    h.superstructure.on_start(0.0);
    assert!(h.superstructure.snapshot().state_changed);

    h.superstructure.pick_up(PickUpHeight::Floor);

    // Tick that computes Idle → PickUpBall: flag set for the next tick.
    h.superstructure.on_loop(0.01);
    assert!(h.superstructure.snapshot().state_changed);

    // First tick inside PickUpBall consumes the edge.
    h.superstructure.on_loop(0.02);
    assert!(!h.superstructure.snapshot().state_changed);

    h.superstructure.on_loop(0.03);
    assert!(!h.superstructure.snapshot().state_changed);
}

// ── Issue-once setpoint discipline ──────────────────────────────────

#[test]
fn pickup_setpoints_issued_once_not_per_tick() {
    let h = harness();
    h.superstructure.on_start(0.0);
    h.superstructure.pick_up(PickUpHeight::Floor);
    tick_n(&h, 0.0, 10);

    assert_eq!(
        h.superstructure.snapshot().system_state,
        SystemState::PickUpBall
    );
    assert_eq!(h.lift.setpoint_commands(), 1);
    assert_eq!(h.wrist.setpoint_commands(), 1);
    assert_eq!(h.lift.setpoint(), Some(h.setpoints.lift.pick_up_floor));
    assert_eq!(h.wrist.setpoint(), Some(h.setpoints.wrist.pick_up_floor));
}

#[test]
fn height_change_mid_maneuver_reissues_exactly_once() {
    let h = harness();
    h.superstructure.on_start(0.0);
    h.superstructure.pick_up(PickUpHeight::Floor);
    let t = tick_n(&h, 0.0, 5);
    assert_eq!(h.lift.setpoint_commands(), 1);

    // Operator flips the height while the maneuver is held.
    h.superstructure.pick_up(PickUpHeight::LoadingStation);
    let t = tick_n(&h, t, 1);
    assert_eq!(h.lift.setpoint_commands(), 2);
    assert_eq!(
        h.lift.setpoint(),
        Some(h.setpoints.lift.pick_up_loading_station)
    );
    assert_eq!(
        h.wrist.setpoint(),
        Some(h.setpoints.wrist.pick_up_loading_station)
    );
    assert_eq!(
        h.superstructure.snapshot().pick_up_height,
        PickUpHeight::LoadingStation
    );

    // No further reissue until the next change.
    tick_n(&h, t, 10);
    assert_eq!(h.lift.setpoint_commands(), 2);
}

// ── Sensor-driven auto-advance ──────────────────────────────────────

#[test]
fn ball_capture_advances_to_carry_when_policy_set() {
    let h = harness();
    h.superstructure.on_start(0.0);
    h.superstructure.pick_up(PickUpHeight::Floor);
    let t = tick_n(&h, 0.0, 3);

    h.intake.set_has_ball(true);
    tick_n(&h, t, 1);
    assert_eq!(
        h.superstructure.snapshot().system_state,
        SystemState::CarryBall
    );
}

#[test]
fn ball_capture_stays_in_pickup_without_policy() {
    let mut policy = PolicyConfig::default();
    policy.carry_after_pickup = false;
    let h = harness_with_policy(policy);
    h.superstructure.on_start(0.0);
    h.superstructure.pick_up(PickUpHeight::Floor);
    let t = tick_n(&h, 0.0, 3);

    h.intake.set_has_ball(true);
    tick_n(&h, t, 5);
    assert_eq!(
        h.superstructure.snapshot().system_state,
        SystemState::PickUpBall
    );
}

#[test]
fn shoot_advances_after_ball_gone_and_pause_elapsed() {
    let h = harness(); // elapsed compare, 0.25 s pause
    h.superstructure.on_start(0.0);
    h.superstructure.set_wanted_state(SystemState::Shoot);
    h.intake.set_sees_ball(true);

    h.superstructure.on_loop(1.0); // Idle → Shoot recorded, entered at 1.0
    h.superstructure.on_loop(1.01); // entry: intake shooting
    assert_eq!(h.intake.wanted_state(), IntakeState::Shooting);

    // Ball still in view: stays put regardless of elapsed time.
    h.superstructure.on_loop(5.0);
    assert_eq!(h.superstructure.snapshot().system_state, SystemState::Shoot);

    // Ball gone but pause not yet elapsed after re-entry timing: use a
    // fresh timeline. Entered at 1.0; at 1.1 elapsed is 0.1 < 0.25.
    let h2 = harness();
    h2.superstructure.on_start(0.0);
    h2.superstructure.set_wanted_state(SystemState::Shoot);
    h2.superstructure.on_loop(1.0);
    h2.superstructure.on_loop(1.05);
    h2.superstructure.on_loop(1.1);
    assert_eq!(
        h2.superstructure.snapshot().system_state,
        SystemState::Shoot
    );

    // Pause elapsed and no ball in view: advance to carry.
    h2.superstructure.on_loop(1.3);
    assert_eq!(
        h2.superstructure.snapshot().system_state,
        SystemState::CarryBall
    );
}

#[test]
fn shoot_pause_entry_timestamp_compare_is_selectable() {
    let mut policy = PolicyConfig::default();
    policy.shoot_pause_compare = ShootPauseCompare::EntryTimestamp;
    policy.carry_pause_after_shoot = 2.0;
    let h = harness_with_policy(policy);

    h.superstructure.on_start(0.0);
    h.superstructure.set_wanted_state(SystemState::Shoot);
    h.superstructure.on_loop(0.5); // entered at 0.5 < 2.0
    h.superstructure.on_loop(10.0);
    h.superstructure.on_loop(20.0);
    // Raw entry timestamp below the threshold pins the state.
    assert_eq!(h.superstructure.snapshot().system_state, SystemState::Shoot);
}

// ── Stop path ───────────────────────────────────────────────────────

#[test]
fn stop_idles_all_subsystems_from_any_state_and_is_idempotent() {
    for wanted in [
        SystemState::Idle,
        SystemState::PickUpBall,
        SystemState::ShootBallPosition,
        SystemState::Shoot,
        SystemState::CarryBall,
        SystemState::Home,
    ] {
        let h = harness();
        h.superstructure.on_start(0.0);
        h.superstructure.set_wanted_state(wanted);
        tick_n(&h, 0.0, 3);

        h.superstructure.stop();
        assert_eq!(h.lift.control_state(), MechanismState::Idle);
        assert_eq!(h.wrist.control_state(), MechanismState::Idle);
        assert_eq!(h.intake.wanted_state(), IntakeState::Idle);

        // Second stop: identical effect.
        let commands_before = h.intake.state_commands();
        h.superstructure.stop();
        assert_eq!(h.lift.control_state(), MechanismState::Idle);
        assert_eq!(h.wrist.control_state(), MechanismState::Idle);
        assert_eq!(h.intake.wanted_state(), IntakeState::Idle);
        assert_eq!(h.intake.state_commands(), commands_before + 1);
    }
}

#[test]
fn on_stop_invokes_stop() {
    let h = harness();
    h.superstructure.on_start(0.0);
    h.superstructure.set_wanted_state(SystemState::Home);
    tick_n(&h, 0.0, 3);
    assert_eq!(h.lift.control_state(), MechanismState::Homing);

    h.superstructure.on_stop(0.05);
    assert_eq!(h.lift.control_state(), MechanismState::Idle);
    assert_eq!(h.wrist.control_state(), MechanismState::Idle);
    assert_eq!(h.intake.wanted_state(), IntakeState::Idle);
}

// ── Cross-thread commands ───────────────────────────────────────────

#[test]
fn concurrent_mode_set_and_tick_leave_no_torn_selection() {
    let h = harness();
    h.superstructure.on_start(0.0);
    h.superstructure.pick_up(PickUpHeight::Floor);
    tick_n(&h, 0.0, 2);

    let commander = h.superstructure.clone();
    let mutator = thread::spawn(move || {
        for i in 0..500 {
            let height = if i % 2 == 0 {
                PickUpHeight::LoadingStation
            } else {
                PickUpHeight::Floor
            };
            commander.pick_up(height);
        }
    });

    let mut t = 0.02;
    for _ in 0..500 {
        t += 0.001;
        h.superstructure.on_loop(t);
    }
    mutator.join().unwrap();

    // One settling tick: any pending selection is latched and issued.
    h.superstructure.on_loop(t + 0.01);
    let snap = h.superstructure.snapshot();
    assert_eq!(snap.system_state, SystemState::PickUpBall);
    assert_eq!(
        h.lift.setpoint(),
        Some(h.setpoints.lift.pick_up(snap.pick_up_height))
    );
    assert_eq!(
        h.wrist.setpoint(),
        Some(h.setpoints.wrist.pick_up(snap.pick_up_height))
    );
}

// ── End-to-end scenario ─────────────────────────────────────────────

#[test]
fn pickup_to_carry_end_to_end() {
    let h = harness();

    h.superstructure.on_start(0.0);
    assert_eq!(h.superstructure.snapshot().system_state, SystemState::Idle);

    h.superstructure.pick_up(PickUpHeight::Floor);

    h.superstructure.on_loop(0.01); // Idle → PickUpBall recorded
    h.superstructure.on_loop(0.02); // pickup entry actions
    assert_eq!(
        h.superstructure.snapshot().system_state,
        SystemState::PickUpBall
    );
    assert_eq!(h.intake.wanted_state(), IntakeState::PickingUp);
    assert_eq!(h.lift.setpoint(), Some(h.setpoints.lift.pick_up_floor));
    assert_eq!(h.wrist.setpoint(), Some(h.setpoints.wrist.pick_up_floor));

    // No ball yet: no state change, no reissue.
    h.superstructure.on_loop(0.03);
    assert_eq!(
        h.superstructure.snapshot().system_state,
        SystemState::PickUpBall
    );
    assert_eq!(h.lift.setpoint_commands(), 1);

    // Ball captured: auto-advance to carry at the default low height.
    h.intake.set_has_ball(true);
    h.superstructure.on_loop(0.04); // PickUpBall → CarryBall recorded
    assert_eq!(
        h.superstructure.snapshot().system_state,
        SystemState::CarryBall
    );
    h.superstructure.on_loop(0.05); // carry entry actions
    assert_eq!(h.intake.wanted_state(), IntakeState::Idle);
    assert_eq!(h.superstructure.snapshot().carry_height, CarryHeight::Low);
    assert_eq!(h.lift.setpoint(), Some(h.setpoints.lift.carry_low));
    assert_eq!(h.wrist.setpoint(), Some(h.setpoints.wrist.carry_low));
}

// ── Shoot positioning heights ───────────────────────────────────────

#[test]
fn all_four_shoot_heights_issue_matching_setpoints() {
    let h = harness();
    h.superstructure.on_start(0.0);

    let mut t = 0.0;
    let mut expected_commands = 0;
    for height in [
        ShootHeight::CargoShip,
        ShootHeight::RocketOne,
        ShootHeight::RocketTwo,
        ShootHeight::RocketThree,
    ] {
        h.superstructure.shoot_position(height);
        t = tick_n(&h, t, 2);
        expected_commands += 1;
        assert_eq!(h.lift.setpoint(), Some(h.setpoints.lift.shoot(height)));
        assert_eq!(h.wrist.setpoint(), Some(h.setpoints.wrist.shoot(height)));
        assert_eq!(h.lift.setpoint_commands(), expected_commands);
    }
}
