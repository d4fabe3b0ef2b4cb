//! State enumerations for the superstructure coordinator.
//!
//! All enums use `#[repr(u8)]` for compact memory layout. Raw values
//! arriving from outside the process (telemetry, command decode) go through
//! `from_u8`, which rejects out-of-range values; decode boundaries map a
//! rejected value to the idle state rather than faulting.

use serde::{Deserialize, Serialize};

// ─── Coordinator State ──────────────────────────────────────────────

/// Top-level superstructure maneuver state.
///
/// Exactly one value is current and one is wanted at any instant. The
/// wanted state takes effect on the next tick of the loop driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SystemState {
    /// Waiting room: all subsystems idle, passes through to the wanted state.
    Idle = 0,
    /// Intake running, lift/wrist at the selected pickup height.
    PickUpBall = 1,
    /// Lift/wrist positioned at the selected shoot height, intake idle.
    ShootBallPosition = 2,
    /// Intake ejecting the ball.
    Shoot = 3,
    /// Ball held, lift/wrist at the selected carry height.
    CarryBall = 4,
    /// Lift and wrist re-homing against their reference sensors.
    Home = 5,
}

impl SystemState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::PickUpBall),
            2 => Some(Self::ShootBallPosition),
            3 => Some(Self::Shoot),
            4 => Some(Self::CarryBall),
            5 => Some(Self::Home),
            _ => None,
        }
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::Idle
    }
}

// ─── Height Selections ──────────────────────────────────────────────

/// Pickup height selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PickUpHeight {
    /// Ball on the carpet.
    Floor = 0,
    /// Ball fed through the loading station slot.
    LoadingStation = 1,
}

impl PickUpHeight {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Floor),
            1 => Some(Self::LoadingStation),
            _ => None,
        }
    }
}

impl Default for PickUpHeight {
    fn default() -> Self {
        Self::Floor
    }
}

/// Shoot height selection, one per scoring target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShootHeight {
    CargoShip = 0,
    RocketOne = 1,
    RocketTwo = 2,
    RocketThree = 3,
}

impl ShootHeight {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::CargoShip),
            1 => Some(Self::RocketOne),
            2 => Some(Self::RocketTwo),
            3 => Some(Self::RocketThree),
            _ => None,
        }
    }
}

impl Default for ShootHeight {
    fn default() -> Self {
        Self::CargoShip
    }
}

/// Carry height selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CarryHeight {
    /// Tucked just above the frame perimeter.
    Low = 0,
    /// Raised for driving over obstacles.
    Middle = 1,
}

impl CarryHeight {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::Middle),
            _ => None,
        }
    }
}

impl Default for CarryHeight {
    fn default() -> Self {
        Self::Low
    }
}

// ─── Collaborator Control States ────────────────────────────────────

/// Control mode of a closed-loop positioning mechanism (lift or wrist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MechanismState {
    /// Output disabled, holding nothing.
    Idle = 0,
    /// Holding a commanded position under closed-loop control.
    ClosedLoop = 1,
    /// Driving toward the reference sensor to re-zero.
    Homing = 2,
}

impl MechanismState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::ClosedLoop),
            2 => Some(Self::Homing),
            _ => None,
        }
    }
}

impl Default for MechanismState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Intake behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum IntakeState {
    /// Rollers stopped.
    Idle = 0,
    /// Rollers pulling a ball in.
    PickingUp = 1,
    /// Rollers ejecting the ball.
    Shooting = 2,
}

impl IntakeState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::PickingUp),
            2 => Some(Self::Shooting),
            _ => None,
        }
    }
}

impl Default for IntakeState {
    fn default() -> Self {
        Self::Idle
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
