//! Builder for [`TicStepper`].
//!
//! Collects motor parameters either field by field or from a parsed
//! configuration, then validates everything and initializes the controller
//! in one step.

use crate::config::units::{Distance, Microsteps, Rpm, RpmPerSec};
use crate::config::{LimitPolicy, MotorConfig, SoftLimits, SystemConfig};
use crate::error::{ConfigError, Result};
use crate::transport::TicTransport;

use super::tic::TicStepper;

/// Builder for a [`TicStepper`] bound to one transport.
///
/// `steps_per_revolution`, `distance_per_revolution`, and `max_speed` are
/// required unless seeded from a [`MotorConfig`]; everything else has the
/// configuration defaults.
pub struct TicStepperBuilder<T> {
    transport: T,
    name: heapless::String<32>,
    steps_per_revolution: Option<u16>,
    microsteps: Microsteps,
    distance_per_revolution: Option<f32>,
    min_speed: Rpm,
    max_speed: Option<Rpm>,
    max_accel: RpmPerSec,
    max_decel: RpmPerSec,
    limits: Option<SoftLimits>,
}

impl<T: TicTransport> TicStepperBuilder<T> {
    /// Start a builder owning the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            name: heapless::String::new(),
            steps_per_revolution: None,
            microsteps: Microsteps::FULL,
            distance_per_revolution: None,
            min_speed: Rpm(0.001),
            max_speed: None,
            max_accel: RpmPerSec(1000.0),
            max_decel: RpmPerSec(1000.0),
            limits: None,
        }
    }

    /// Seed every parameter from an existing motor configuration.
    pub fn from_motor_config(transport: T, config: &MotorConfig) -> Self {
        Self {
            transport,
            name: config.name.clone(),
            steps_per_revolution: Some(config.steps_per_revolution),
            microsteps: config.microsteps,
            distance_per_revolution: Some(config.distance_per_revolution),
            min_speed: config.min_speed,
            max_speed: Some(config.max_speed),
            max_accel: config.max_accel,
            max_decel: config.max_decel,
            limits: config.limits.clone(),
        }
    }

    /// Seed from a named motor in a system configuration.
    pub fn from_config(transport: T, config: &SystemConfig, name: &str) -> Result<Self> {
        let motor = config.motor(name).ok_or_else(|| {
            let mut owned = heapless::String::new();
            for c in name.chars() {
                if owned.push(c).is_err() {
                    break;
                }
            }
            ConfigError::MotorNotFound(owned)
        })?;
        Ok(Self::from_motor_config(transport, motor))
    }

    /// Set the motor name used in diagnostics. Truncated to 32 bytes.
    pub fn name(mut self, name: &str) -> Self {
        self.name.clear();
        for c in name.chars() {
            if self.name.push(c).is_err() {
                break;
            }
        }
        self
    }

    /// Set full steps per motor revolution.
    pub fn steps_per_revolution(mut self, steps: u16) -> Self {
        self.steps_per_revolution = Some(steps);
        self
    }

    /// Set the initial microstep divisor.
    pub fn microsteps(mut self, microsteps: Microsteps) -> Self {
        self.microsteps = microsteps;
        self
    }

    /// Set the distance traveled per revolution, in user units.
    pub fn distance_per_revolution(mut self, distance: f32) -> Self {
        self.distance_per_revolution = Some(distance);
        self
    }

    /// Set the minimum speed magnitude in RPM.
    pub fn min_speed(mut self, speed: Rpm) -> Self {
        self.min_speed = speed;
        self
    }

    /// Set the maximum speed magnitude in RPM.
    pub fn max_speed(mut self, speed: Rpm) -> Self {
        self.max_speed = Some(speed);
        self
    }

    /// Set the acceleration cap in RPM per second.
    pub fn max_accel(mut self, accel: RpmPerSec) -> Self {
        self.max_accel = accel;
        self
    }

    /// Set the deceleration cap in RPM per second.
    pub fn max_decel(mut self, decel: RpmPerSec) -> Self {
        self.max_decel = decel;
        self
    }

    /// Set soft position limits in distance units.
    pub fn soft_limits(mut self, min: Distance, max: Distance, policy: LimitPolicy) -> Self {
        self.limits = Some(SoftLimits::new(min, max, policy));
        self
    }

    /// Validate the collected parameters and initialize the controller.
    pub fn build(self) -> Result<TicStepper<T>> {
        let config = MotorConfig {
            name: self.name,
            steps_per_revolution: self
                .steps_per_revolution
                .ok_or(ConfigError::MissingField("steps_per_revolution"))?,
            microsteps: self.microsteps,
            distance_per_revolution: self
                .distance_per_revolution
                .ok_or(ConfigError::MissingField("distance_per_revolution"))?,
            min_speed: self.min_speed,
            max_speed: self
                .max_speed
                .ok_or(ConfigError::MissingField("max_speed"))?,
            max_accel: self.max_accel,
            max_decel: self.max_decel,
            limits: self.limits,
        };
        TicStepper::new(self.transport, &config)
    }
}
