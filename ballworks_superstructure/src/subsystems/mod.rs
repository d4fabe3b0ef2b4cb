//! Collaborator subsystem contracts.
//!
//! Each subsystem owns its internal closed-loop control and hardware I/O;
//! the coordinator only sees these narrow command/query surfaces. Every
//! operation must be non-blocking; calls are made while the coordinator
//! holds its mutex inside the control tick.

use ballworks_common::state::{IntakeState, MechanismState};

pub mod sim;

/// A closed-loop positioning mechanism: the lift or the wrist.
///
/// Implementations use interior mutability; handles are shared between the
/// coordinator and whatever drives the mechanism's own control loop.
pub trait Mechanism: Send + Sync {
    /// Command the mechanism to hold a position under closed-loop control.
    fn set_closed_loop(&self, setpoint: f64);

    /// Switch the mechanism's control mode.
    fn set_wanted_state(&self, state: MechanismState);

    /// Apply a manual nudge, valid regardless of the current control mode.
    fn jog(&self, delta: f64);
}

/// The ball intake: roller control plus ball presence sensing.
pub trait BallIntake: Send + Sync {
    /// Switch the intake behavior.
    fn set_wanted_state(&self, state: IntakeState);

    /// True once a ball is fully captured.
    fn has_ball(&self) -> bool;

    /// True while a ball is detected in the sensing zone.
    fn sees_ball(&self) -> bool;
}
