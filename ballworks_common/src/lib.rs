//! # Ballworks Common Library
//!
//! Shared types for the Ballworks superstructure coordinator: the closed
//! state enumerations for the coordinator and its collaborator subsystems,
//! the wanted/current mode register that implements issue-once setpoint
//! discipline, and the TOML configuration types with validation.
//!
//! # Module Structure
//!
//! - [`state`] - Closed state enumerations (system, heights, subsystem modes)
//! - [`register`] - Wanted/current mode register
//! - [`config`] - Configuration types, defaults, and validation

pub mod config;
pub mod register;
pub mod state;
