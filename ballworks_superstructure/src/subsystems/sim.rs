//! In-memory subsystem implementations.
//!
//! `SimMechanism` and `SimIntake` record every command they receive and
//! expose scriptable sensor flags. They back the binary when no hardware is
//! attached and give tests a way to assert on command issuance counts.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use ballworks_common::state::{IntakeState, MechanismState};

use super::{BallIntake, Mechanism};

// ─── Mechanism ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MechanismLog {
    control_state: MechanismState,
    setpoint: Option<f64>,
    setpoint_commands: u32,
    state_commands: u32,
    jog_offset: f64,
}

/// Recording lift/wrist stand-in.
#[derive(Debug)]
pub struct SimMechanism {
    name: &'static str,
    log: Mutex<MechanismLog>,
}

impl SimMechanism {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            log: Mutex::new(MechanismLog::default()),
        }
    }

    /// Control mode last commanded.
    pub fn control_state(&self) -> MechanismState {
        self.log.lock().control_state
    }

    /// Setpoint last commanded, if any.
    pub fn setpoint(&self) -> Option<f64> {
        self.log.lock().setpoint
    }

    /// Total `set_closed_loop` commands received.
    pub fn setpoint_commands(&self) -> u32 {
        self.log.lock().setpoint_commands
    }

    /// Total `set_wanted_state` commands received.
    pub fn state_commands(&self) -> u32 {
        self.log.lock().state_commands
    }

    /// Accumulated jog offset.
    pub fn jog_offset(&self) -> f64 {
        self.log.lock().jog_offset
    }
}

impl Mechanism for SimMechanism {
    fn set_closed_loop(&self, setpoint: f64) {
        let mut log = self.log.lock();
        log.control_state = MechanismState::ClosedLoop;
        log.setpoint = Some(setpoint);
        log.setpoint_commands += 1;
        debug!(mechanism = self.name, setpoint, "closed-loop setpoint");
    }

    fn set_wanted_state(&self, state: MechanismState) {
        let mut log = self.log.lock();
        log.control_state = state;
        log.state_commands += 1;
        debug!(mechanism = self.name, ?state, "control state");
    }

    fn jog(&self, delta: f64) {
        self.log.lock().jog_offset += delta;
        debug!(mechanism = self.name, delta, "jog");
    }
}

// ─── Intake ─────────────────────────────────────────────────────────

/// Recording intake stand-in with scriptable ball sensors.
#[derive(Debug)]
pub struct SimIntake {
    state: Mutex<IntakeState>,
    state_commands: Mutex<u32>,
    has_ball: AtomicBool,
    sees_ball: AtomicBool,
}

impl SimIntake {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IntakeState::Idle),
            state_commands: Mutex::new(0),
            has_ball: AtomicBool::new(false),
            sees_ball: AtomicBool::new(false),
        }
    }

    /// Behavior state last commanded.
    pub fn wanted_state(&self) -> IntakeState {
        *self.state.lock()
    }

    /// Total `set_wanted_state` commands received.
    pub fn state_commands(&self) -> u32 {
        *self.state_commands.lock()
    }

    /// Script the ball-captured sensor.
    pub fn set_has_ball(&self, value: bool) {
        self.has_ball.store(value, Ordering::SeqCst);
    }

    /// Script the ball-in-view sensor.
    pub fn set_sees_ball(&self, value: bool) {
        self.sees_ball.store(value, Ordering::SeqCst);
    }
}

impl Default for SimIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl BallIntake for SimIntake {
    fn set_wanted_state(&self, state: IntakeState) {
        *self.state.lock() = state;
        *self.state_commands.lock() += 1;
        debug!(?state, "intake state");
    }

    fn has_ball(&self) -> bool {
        self.has_ball.load(Ordering::SeqCst)
    }

    fn sees_ball(&self) -> bool {
        self.sees_ball.load(Ordering::SeqCst)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
