//! Configuration types for the superstructure coordinator.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every field
//! carries a `#[serde(default)]` so a partial (or empty) file yields a
//! usable configuration; numeric parameters have const bounds checked by
//! `validate()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),
    /// File I/O error.
    #[error("config I/O error: {0}")]
    IoError(String),
    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),
    /// Semantic validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

// ─── Defaults & Bounds ──────────────────────────────────────────────

/// Default loop period [ms].
pub const LOOP_PERIOD_MS_DEFAULT: u32 = 10;
/// Minimum loop period [ms].
pub const LOOP_PERIOD_MS_MIN: u32 = 1;
/// Maximum loop period [ms].
pub const LOOP_PERIOD_MS_MAX: u32 = 100;
/// Default pause after the ball leaves the intake before carrying [s].
pub const CARRY_PAUSE_AFTER_SHOOT_DEFAULT: f64 = 0.25;

// ─── Loop Driver Config ─────────────────────────────────────────────

/// Loop driver configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Tick period [ms] (default: 10).
    #[serde(default = "default_period_ms")]
    pub period_ms: u32,

    /// CPU core to pin the loop thread to (`rt` builds only, default: 1).
    #[serde(default = "default_rt_cpu_core")]
    pub rt_cpu_core: usize,

    /// SCHED_FIFO priority for the loop thread (`rt` builds only, default: 80).
    #[serde(default = "default_rt_priority")]
    pub rt_priority: i32,
}

fn default_period_ms() -> u32 {
    LOOP_PERIOD_MS_DEFAULT
}
fn default_rt_cpu_core() -> usize {
    1
}
fn default_rt_priority() -> i32 {
    80
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            rt_cpu_core: default_rt_cpu_core(),
            rt_priority: default_rt_priority(),
        }
    }
}

// ─── Policy Config ──────────────────────────────────────────────────

/// How the Shoot handler evaluates the post-shoot pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShootPauseCompare {
    /// Compare elapsed time in the Shoot state against the pause threshold.
    #[default]
    Elapsed,
    /// Compare the raw state-entry timestamp against the pause threshold.
    /// Matches controllers that treat the entry timestamp itself as the
    /// pause gate; selectable for integrations that depend on it.
    EntryTimestamp,
}

/// Maneuver auto-advance policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Auto-transition PickUpBall → CarryBall once a ball is captured
    /// (default: true).
    #[serde(default = "default_true")]
    pub carry_after_pickup: bool,

    /// Reserved: auto-transition Shoot → CarryBall gate. The Shoot handler
    /// currently advances unconditionally once the ball is gone and the
    /// pause has elapsed; this flag is parsed but not consulted.
    #[serde(default = "default_true")]
    pub carry_after_shoot: bool,

    /// Minimum pause in the Shoot state before advancing to CarryBall [s]
    /// (default: 0.25).
    #[serde(default = "default_carry_pause")]
    pub carry_pause_after_shoot: f64,

    /// Post-shoot pause comparison mode (default: elapsed).
    #[serde(default)]
    pub shoot_pause_compare: ShootPauseCompare,
}

fn default_true() -> bool {
    true
}
fn default_carry_pause() -> f64 {
    CARRY_PAUSE_AFTER_SHOOT_DEFAULT
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            carry_after_pickup: true,
            carry_after_shoot: true,
            carry_pause_after_shoot: default_carry_pause(),
            shoot_pause_compare: ShootPauseCompare::default(),
        }
    }
}

// ─── Setpoint Tables ────────────────────────────────────────────────

/// Closed-loop setpoints for one mechanism, one value per
/// (maneuver, height) pair. Lift values are carriage heights [in],
/// wrist values are angles [deg].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanismSetpoints {
    pub pick_up_floor: f64,
    pub pick_up_loading_station: f64,
    pub shoot_cargo_ship: f64,
    pub shoot_rocket_one: f64,
    pub shoot_rocket_two: f64,
    pub shoot_rocket_three: f64,
    pub carry_low: f64,
    pub carry_middle: f64,
}

impl MechanismSetpoints {
    /// Setpoint for a pickup height.
    #[inline]
    pub const fn pick_up(&self, height: crate::state::PickUpHeight) -> f64 {
        match height {
            crate::state::PickUpHeight::Floor => self.pick_up_floor,
            crate::state::PickUpHeight::LoadingStation => self.pick_up_loading_station,
        }
    }

    /// Setpoint for a shoot height.
    #[inline]
    pub const fn shoot(&self, height: crate::state::ShootHeight) -> f64 {
        match height {
            crate::state::ShootHeight::CargoShip => self.shoot_cargo_ship,
            crate::state::ShootHeight::RocketOne => self.shoot_rocket_one,
            crate::state::ShootHeight::RocketTwo => self.shoot_rocket_two,
            crate::state::ShootHeight::RocketThree => self.shoot_rocket_three,
        }
    }

    /// Setpoint for a carry height.
    #[inline]
    pub const fn carry(&self, height: crate::state::CarryHeight) -> f64 {
        match height {
            crate::state::CarryHeight::Low => self.carry_low,
            crate::state::CarryHeight::Middle => self.carry_middle,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("pick_up_floor", self.pick_up_floor),
            ("pick_up_loading_station", self.pick_up_loading_station),
            ("shoot_cargo_ship", self.shoot_cargo_ship),
            ("shoot_rocket_one", self.shoot_rocket_one),
            ("shoot_rocket_two", self.shoot_rocket_two),
            ("shoot_rocket_three", self.shoot_rocket_three),
            ("carry_low", self.carry_low),
            ("carry_middle", self.carry_middle),
        ]
    }
}

/// Default lift setpoints [in], measured on the practice mechanism.
impl Default for MechanismSetpoints {
    fn default() -> Self {
        Self {
            pick_up_floor: 0.0,
            pick_up_loading_station: 19.0,
            shoot_cargo_ship: 24.5,
            shoot_rocket_one: 12.0,
            shoot_rocket_two: 40.0,
            shoot_rocket_three: 66.0,
            carry_low: 4.0,
            carry_middle: 30.0,
        }
    }
}

/// Lift and wrist setpoint tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SetpointConfig {
    pub lift: MechanismSetpoints,
    pub wrist: MechanismSetpoints,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            lift: MechanismSetpoints::default(),
            wrist: MechanismSetpoints {
                pick_up_floor: -15.0,
                pick_up_loading_station: 0.0,
                shoot_cargo_ship: 10.0,
                shoot_rocket_one: 15.0,
                shoot_rocket_two: 15.0,
                shoot_rocket_three: 20.0,
                carry_low: 45.0,
                carry_middle: 45.0,
            },
        }
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level superstructure configuration.
///
/// Loaded from TOML at startup, immutable afterwards.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperstructureConfig {
    /// Loop driver settings.
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    /// Maneuver auto-advance policy.
    pub policy: PolicyConfig,
    /// Lift and wrist setpoint tables.
    pub setpoints: SetpointConfig,
}

impl SuperstructureConfig {
    /// Validate parameter bounds. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.loop_config.period_ms < LOOP_PERIOD_MS_MIN
            || self.loop_config.period_ms > LOOP_PERIOD_MS_MAX
        {
            return Err(format!(
                "loop.period_ms {} out of range [{LOOP_PERIOD_MS_MIN}, {LOOP_PERIOD_MS_MAX}]",
                self.loop_config.period_ms
            ));
        }

        if !self.policy.carry_pause_after_shoot.is_finite()
            || self.policy.carry_pause_after_shoot < 0.0
        {
            return Err(format!(
                "policy.carry_pause_after_shoot {} must be finite and >= 0",
                self.policy.carry_pause_after_shoot
            ));
        }

        for (table, setpoints) in [
            ("setpoints.lift", &self.setpoints.lift),
            ("setpoints.wrist", &self.setpoints.wrist),
        ] {
            for (name, value) in setpoints.entries() {
                if !value.is_finite() {
                    return Err(format!("{table}.{name} must be finite, got {value}"));
                }
            }
        }

        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
