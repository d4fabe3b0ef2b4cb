//! # Ballworks Superstructure
//!
//! Periodic coordinator for the robot's ball-handling superstructure: the
//! lift, wrist, and intake treated as one composite mechanism. A finite
//! state machine arbitrates the three subsystems to execute compound
//! maneuvers (pick up, position for shoot, shoot, carry, home), advancing
//! automatically on sensor conditions and issuing closed-loop setpoints
//! exactly once per logical change so operators can jog a held position.
//!
//! ## Architecture
//!
//! - One explicitly constructed [`superstructure::Superstructure`] instance,
//!   shared by the loop driver and the command layer.
//! - All mutable coordinator state sits behind a single mutex; every public
//!   operation and every lifecycle callback holds it for its full duration,
//!   which is the sole source of cross-thread ordering.
//! - The tick never blocks, sleeps, or performs I/O; subsystem commands are
//!   non-blocking fire-and-forget and idempotent by construction.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod looper;
pub mod subsystems;
pub mod superstructure;
