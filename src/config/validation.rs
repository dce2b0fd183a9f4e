//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::motor::MotorConfig;
use super::SystemConfig;

/// Validate a system configuration.
///
/// Checks:
/// - Steps and distance per revolution are positive
/// - Speed bounds satisfy 0 < min < max
/// - Acceleration/deceleration caps are positive
/// - Soft limits are valid (min < max)
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (name, motor) in config.motors.iter() {
        validate_motor(name.as_str(), motor)?;
    }

    Ok(())
}

/// Validate a single motor configuration.
pub fn validate_motor(_name: &str, config: &MotorConfig) -> Result<()> {
    if config.steps_per_revolution == 0 {
        return Err(Error::Config(ConfigError::InvalidStepsPerRev(
            config.steps_per_revolution,
        )));
    }

    if config.distance_per_revolution <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidDistancePerRev(
            config.distance_per_revolution,
        )));
    }

    if config.min_speed.0 <= 0.0 || config.min_speed.0 >= config.max_speed.0 {
        return Err(Error::Config(ConfigError::InvalidSpeedBounds {
            min: config.min_speed.0,
            max: config.max_speed.0,
        }));
    }

    if config.max_accel.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAccelCap(config.max_accel.0)));
    }

    if config.max_decel.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAccelCap(config.max_decel.0)));
    }

    if let Some(ref limits) = config.limits {
        if !limits.is_valid() {
            return Err(Error::Config(ConfigError::InvalidSoftLimits {
                min: limits.min.0,
                max: limits.max.0,
            }));
        }
    }

    Ok(())
}
