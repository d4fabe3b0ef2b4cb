//! Superstructure coordinator state machine.
//!
//! Arbitrates the lift, wrist, and intake to execute compound ball-handling
//! maneuvers. The loop driver invokes the lifecycle callbacks on its own
//! thread; the command layer calls the public operations from any other
//! thread. One mutex guards all mutable coordinator state and is held for
//! the full duration of every operation and every tick, so a command lands
//! entirely before or after a given tick, never torn across one.
//!
//! Setpoint issuance discipline: a closed-loop setpoint goes to the lift
//! and wrist at most once per distinct (state, height) pair: on state
//! entry, and again only when the height selection changes while the state
//! is held. Jogging a mechanism away from a held setpoint is therefore
//! never fought by the tick.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use ballworks_common::config::{PolicyConfig, SetpointConfig, ShootPauseCompare};
use ballworks_common::register::ModeRegister;
use ballworks_common::state::{
    CarryHeight, IntakeState, MechanismState, PickUpHeight, ShootHeight, SystemState,
};

use crate::looper::Loop;
use crate::subsystems::{BallIntake, Mechanism};

// ─── Shared State ───────────────────────────────────────────────────

/// All mutable coordinator state, guarded by the instance mutex.
#[derive(Debug, Clone, Copy)]
struct SharedState {
    /// State the machine is currently executing.
    system_state: SystemState,
    /// State requested by the command layer; applied by handlers.
    wanted_state: SystemState,
    /// Timestamp at which `system_state` was entered [s].
    state_start_time: f64,
    /// True for exactly the first tick after a transition.
    state_changed: bool,
    pick_up_height: ModeRegister<PickUpHeight>,
    shoot_height: ModeRegister<ShootHeight>,
    carry_height: ModeRegister<CarryHeight>,
}

impl SharedState {
    fn new() -> Self {
        Self {
            system_state: SystemState::Idle,
            wanted_state: SystemState::Idle,
            state_start_time: 0.0,
            state_changed: true,
            pick_up_height: ModeRegister::default(),
            shoot_height: ModeRegister::default(),
            carry_height: ModeRegister::default(),
        }
    }
}

/// Read-only diagnostic snapshot of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub system_state: SystemState,
    pub wanted_state: SystemState,
    pub state_changed: bool,
    pub state_start_time: f64,
    pub pick_up_height: PickUpHeight,
    pub shoot_height: ShootHeight,
    pub carry_height: CarryHeight,
}

// ─── Coordinator ────────────────────────────────────────────────────

/// The superstructure coordinator.
///
/// Constructed once by the composition root and shared (via `Arc`) between
/// the loop driver and the command layer. Holds non-owning handles to the
/// three collaborator subsystems for the life of the process.
pub struct Superstructure {
    lift: Arc<dyn Mechanism>,
    wrist: Arc<dyn Mechanism>,
    intake: Arc<dyn BallIntake>,
    setpoints: SetpointConfig,
    policy: PolicyConfig,
    shared: Mutex<SharedState>,
}

impl Superstructure {
    pub fn new(
        lift: Arc<dyn Mechanism>,
        wrist: Arc<dyn Mechanism>,
        intake: Arc<dyn BallIntake>,
        setpoints: SetpointConfig,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            lift,
            wrist,
            intake,
            setpoints,
            policy,
            shared: Mutex::new(SharedState::new()),
        }
    }

    // ── Command surface ─────────────────────────────────────────────

    /// Request a top-level state. No immediate side effect; the handler for
    /// the current state applies it on the next tick.
    pub fn set_wanted_state(&self, wanted: SystemState) {
        self.shared.lock().wanted_state = wanted;
    }

    /// Request a ball pickup at the given height.
    pub fn pick_up(&self, height: PickUpHeight) {
        let mut shared = self.shared.lock();
        shared.wanted_state = SystemState::PickUpBall;
        shared.pick_up_height.set_wanted(height);
    }

    /// Request positioning for a shot at the given height.
    pub fn shoot_position(&self, height: ShootHeight) {
        let mut shared = self.shared.lock();
        shared.wanted_state = SystemState::ShootBallPosition;
        shared.shoot_height.set_wanted(height);
    }

    /// Request carrying the ball at the given height.
    pub fn carry(&self, height: CarryHeight) {
        let mut shared = self.shared.lock();
        shared.wanted_state = SystemState::CarryBall;
        shared.carry_height.set_wanted(height);
    }

    /// Manually nudge the lift. Valid in any state; bypasses setpoint
    /// issuance so a held position can be trimmed.
    pub fn jog_lift(&self, delta: f64) {
        let _shared = self.shared.lock();
        self.lift.jog(delta);
    }

    /// Manually nudge the wrist. Valid in any state.
    pub fn jog_wrist(&self, delta: f64) {
        let _shared = self.shared.lock();
        self.wrist.jog(delta);
    }

    /// Command all three subsystems to their idle control state.
    ///
    /// Callable at any time, including mid-transition, and idempotent.
    pub fn stop(&self) {
        let _shared = self.shared.lock();
        self.stop_subsystems();
    }

    /// Diagnostic snapshot of the coordinator state.
    pub fn snapshot(&self) -> Snapshot {
        let shared = self.shared.lock();
        Snapshot {
            system_state: shared.system_state,
            wanted_state: shared.wanted_state,
            state_changed: shared.state_changed,
            state_start_time: shared.state_start_time,
            pick_up_height: shared.pick_up_height.current(),
            shoot_height: shared.shoot_height.current(),
            carry_height: shared.carry_height.current(),
        }
    }

    /// Idle all subsystems. Caller already holds the mutex (or does not
    /// need it: no coordinator state is touched).
    fn stop_subsystems(&self) {
        self.lift.set_wanted_state(MechanismState::Idle);
        self.wrist.set_wanted_state(MechanismState::Idle);
        self.intake.set_wanted_state(IntakeState::Idle);
    }

    // ── State handlers ──────────────────────────────────────────────
    //
    // Each handler runs under the mutex, reads the transition flag, and
    // returns the next state. Handlers never block.

    fn handle_idle(&self, shared: &mut SharedState) -> SystemState {
        if shared.state_changed {
            self.stop_subsystems();
        }

        shared.wanted_state
    }

    fn handle_pick_up_ball(&self, shared: &mut SharedState) -> SystemState {
        if shared.state_changed {
            self.intake.set_wanted_state(IntakeState::PickingUp);
        }

        if let Some(height) = shared.pick_up_height.latch(shared.state_changed) {
            self.lift.set_closed_loop(self.setpoints.lift.pick_up(height));
            self.wrist.set_closed_loop(self.setpoints.wrist.pick_up(height));
        }

        if self.intake.has_ball() && self.policy.carry_after_pickup {
            SystemState::CarryBall
        } else {
            shared.wanted_state
        }
    }

    fn handle_shoot_ball_position(&self, shared: &mut SharedState) -> SystemState {
        if shared.state_changed {
            self.intake.set_wanted_state(IntakeState::Idle);
        }

        if let Some(height) = shared.shoot_height.latch(shared.state_changed) {
            self.lift.set_closed_loop(self.setpoints.lift.shoot(height));
            self.wrist.set_closed_loop(self.setpoints.wrist.shoot(height));
        }

        // No automatic exit; the maneuver is left explicitly.
        shared.wanted_state
    }

    fn handle_shoot(&self, shared: &mut SharedState, timestamp: f64) -> SystemState {
        if shared.state_changed {
            self.intake.set_wanted_state(IntakeState::Shooting);
        }

        let pause_satisfied = match self.policy.shoot_pause_compare {
            ShootPauseCompare::Elapsed => {
                timestamp - shared.state_start_time >= self.policy.carry_pause_after_shoot
            }
            ShootPauseCompare::EntryTimestamp => {
                shared.state_start_time >= self.policy.carry_pause_after_shoot
            }
        };

        if !self.intake.sees_ball() && pause_satisfied {
            SystemState::CarryBall
        } else {
            shared.wanted_state
        }
    }

    fn handle_carry_ball(&self, shared: &mut SharedState) -> SystemState {
        if shared.state_changed {
            self.intake.set_wanted_state(IntakeState::Idle);
        }

        if let Some(height) = shared.carry_height.latch(shared.state_changed) {
            self.lift.set_closed_loop(self.setpoints.lift.carry(height));
            self.wrist.set_closed_loop(self.setpoints.wrist.carry(height));
        }

        shared.wanted_state
    }

    fn handle_home(&self, shared: &mut SharedState) -> SystemState {
        if shared.state_changed {
            self.lift.set_wanted_state(MechanismState::Homing);
            self.wrist.set_wanted_state(MechanismState::Homing);
        }

        shared.wanted_state
    }
}

// ─── Lifecycle ──────────────────────────────────────────────────────

impl Loop for Superstructure {
    fn on_start(&self, timestamp: f64) {
        let mut shared = self.shared.lock();
        shared.wanted_state = SystemState::Idle;
        shared.system_state = SystemState::Idle;
        shared.state_start_time = timestamp;
        shared.state_changed = true;
    }

    fn on_loop(&self, timestamp: f64) {
        let mut shared = self.shared.lock();

        let new_state = match shared.system_state {
            SystemState::Idle => self.handle_idle(&mut shared),
            SystemState::PickUpBall => self.handle_pick_up_ball(&mut shared),
            SystemState::ShootBallPosition => self.handle_shoot_ball_position(&mut shared),
            SystemState::Shoot => self.handle_shoot(&mut shared, timestamp),
            SystemState::CarryBall => self.handle_carry_ball(&mut shared),
            SystemState::Home => self.handle_home(&mut shared),
        };

        if new_state != shared.system_state {
            info!(
                from = ?shared.system_state,
                to = ?new_state,
                timestamp,
                "superstructure transition"
            );
            shared.system_state = new_state;
            shared.state_start_time = timestamp;
            shared.state_changed = true;
        } else {
            shared.state_changed = false;
        }
    }

    fn on_stop(&self, _timestamp: f64) {
        self.stop();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
