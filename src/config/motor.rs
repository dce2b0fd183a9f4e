//! Motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::limits::SoftLimits;
use super::units::{Microsteps, Rpm, RpmPerSec};

/// Complete motor configuration from TOML.
///
/// Immutable after construction; the driver derives all conversion factors
/// and bounds checks from it.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Base steps per revolution (typically 200 for 1.8° motors).
    pub steps_per_revolution: u16,

    /// Initial microstep setting (1, 2, 4, 8, ...).
    #[serde(default)]
    pub microsteps: Microsteps,

    /// Caller-defined distance units per revolution (e.g. mm of travel on a
    /// lead screw). Must be > 0.
    pub distance_per_revolution: f32,

    /// Minimum commandable speed in RPM.
    #[serde(rename = "min_speed_rpm", default = "default_min_speed")]
    pub min_speed: Rpm,

    /// Maximum commandable speed in RPM.
    #[serde(rename = "max_speed_rpm")]
    pub max_speed: Rpm,

    /// Cap for acceleration commands, in RPM per second.
    #[serde(rename = "max_accel_rpm_per_sec", default = "default_accel_cap")]
    pub max_accel: RpmPerSec,

    /// Cap for deceleration commands, in RPM per second.
    #[serde(rename = "max_decel_rpm_per_sec", default = "default_accel_cap")]
    pub max_decel: RpmPerSec,

    /// Optional soft position limits.
    #[serde(default)]
    pub limits: Option<SoftLimits>,
}

fn default_min_speed() -> Rpm {
    Rpm(0.001)
}

fn default_accel_cap() -> RpmPerSec {
    RpmPerSec(1000.0)
}

impl MotorConfig {
    /// Total microsteps per revolution at the configured microstep setting.
    pub fn steps_per_revolution_microstepped(&self) -> u32 {
        self.steps_per_revolution as u32 * self.microsteps.value() as u32
    }

    /// Microsteps per distance unit at the configured microstep setting.
    pub fn steps_per_unit(&self) -> f32 {
        self.steps_per_revolution_microstepped() as f32 / self.distance_per_revolution
    }
}
