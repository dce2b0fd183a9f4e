//! Shared stepper state and unit conversions.
//!
//! [`StepperCore`] holds the motor's physical parameters and performs every
//! step/distance/speed conversion, independent of any controller protocol.
//! Concrete drivers compose it and layer their wire encoding on top.
//!
//! Conversion factors are always *derived* from the stored microstep divisor,
//! never accumulated across calls, so changing microsteps repeatedly (or
//! redundantly) can never drift the commanded physical speed or position.

use libm::roundf;

use crate::config::units::{Distance, Microsteps, Rpm, Steps};
use crate::config::{MotorConfig, SoftLimits, StepLimits};
use crate::error::{RangeError, Result};

/// Motor physical parameters and soft state shared by concrete drivers.
#[derive(Debug, Clone)]
pub struct StepperCore {
    steps_per_rev: u16,
    dist_per_rev: f32,
    microsteps: Microsteps,
    min_speed: Rpm,
    max_speed: Rpm,
    limits: Option<SoftLimits>,
    commanded_speed: Rpm,
    target_steps: Steps,
    enabled: bool,
}

impl StepperCore {
    /// Build the core from a validated motor configuration.
    ///
    /// Run [`validate_motor`](crate::config::validate_motor) first; this
    /// constructor assumes the config invariants hold.
    pub fn from_config(config: &MotorConfig) -> Self {
        Self {
            steps_per_rev: config.steps_per_revolution,
            dist_per_rev: config.distance_per_revolution,
            microsteps: config.microsteps,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            limits: config.limits.clone(),
            commanded_speed: Rpm(0.0),
            target_steps: Steps(0),
            enabled: false,
        }
    }

    /// Current microstep divisor.
    #[inline]
    pub fn microsteps(&self) -> Microsteps {
        self.microsteps
    }

    /// Configured minimum speed magnitude.
    #[inline]
    pub fn min_speed(&self) -> Rpm {
        self.min_speed
    }

    /// Configured maximum speed magnitude.
    #[inline]
    pub fn max_speed(&self) -> Rpm {
        self.max_speed
    }

    /// Microsteps per distance unit at the current divisor.
    #[inline]
    pub fn steps_per_unit(&self) -> f32 {
        self.steps_per_rev as f32 * self.microsteps.value() as f32 / self.dist_per_rev
    }

    /// Microsteps per second corresponding to one RPM at the current divisor.
    #[inline]
    fn steps_per_sec_per_rpm(&self) -> f32 {
        self.steps_per_rev as f32 * self.microsteps.value() as f32 / 60.0
    }

    /// Change the microstep divisor.
    ///
    /// The cached target position is rescaled by the exact divisor ratio so
    /// its physical meaning is preserved, and commanded speed is stored
    /// physically (RPM), so repeated calls are idempotent.
    pub fn set_microsteps(&mut self, microsteps: Microsteps) {
        let old = self.microsteps.value() as i64;
        let new = microsteps.value() as i64;
        if old != new {
            let rescaled = self.target_steps.0 as i64 * new / old;
            self.target_steps = Steps(rescaled as i32);
        }
        self.microsteps = microsteps;
    }

    /// Convert a distance to microsteps, rounding to the nearest step.
    #[inline]
    pub fn distance_to_steps(&self, distance: Distance) -> Steps {
        Steps(roundf(distance.0 * self.steps_per_unit()) as i32)
    }

    /// Convert microsteps to distance.
    #[inline]
    pub fn steps_to_distance(&self, steps: Steps) -> Distance {
        Distance(steps.0 as f32 / self.steps_per_unit())
    }

    /// Convert a rotational speed to microsteps per second.
    #[inline]
    pub fn rpm_to_steps_per_sec(&self, speed: Rpm) -> f32 {
        speed.0 * self.steps_per_sec_per_rpm()
    }

    /// Convert microsteps per second to a rotational speed.
    #[inline]
    pub fn steps_per_sec_to_rpm(&self, steps_per_sec: f32) -> Rpm {
        Rpm(steps_per_sec / self.steps_per_sec_per_rpm())
    }

    /// Validate a speed command against the configured bounds.
    ///
    /// The sign carries direction; the magnitude must lie within
    /// `[min_speed, max_speed]`.
    pub fn check_speed(&self, speed: Rpm) -> Result<Rpm> {
        let magnitude = speed.abs().0;
        if magnitude < self.min_speed.0 || magnitude > self.max_speed.0 {
            return Err(RangeError::SpeedOutOfRange {
                requested: speed.0,
                min: self.min_speed.0,
                max: self.max_speed.0,
            }
            .into());
        }
        Ok(speed)
    }

    /// Validate a target position against the soft limits.
    ///
    /// Limits are converted to steps with the *current* microstep factor on
    /// every call. Returns the (possibly clamped) target.
    pub fn check_target(&self, target: Steps) -> Result<Steps> {
        match &self.limits {
            None => Ok(target),
            Some(soft) => {
                let limits = StepLimits::from_soft_limits(soft, self.steps_per_unit());
                limits
                    .apply(target.0)
                    .map(Steps)
                    .ok_or_else(|| {
                        RangeError::PositionOutOfRange {
                            target: target.0,
                            min: limits.min_steps,
                            max: limits.max_steps,
                        }
                        .into()
                    })
            }
        }
    }

    /// Last acknowledged commanded speed.
    #[inline]
    pub fn commanded_speed(&self) -> Rpm {
        self.commanded_speed
    }

    /// Record an acknowledged speed command.
    #[inline]
    pub fn set_commanded_speed(&mut self, speed: Rpm) {
        self.commanded_speed = speed;
    }

    /// Last acknowledged target position.
    #[inline]
    pub fn target_steps(&self) -> Steps {
        self.target_steps
    }

    /// Record an acknowledged target position.
    #[inline]
    pub fn set_target_steps(&mut self, target: Steps) {
        self.target_steps = target;
    }

    /// Software enable flag.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Record an acknowledged enable/disable.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::RpmPerSec;
    use crate::config::LimitPolicy;
    use crate::error::Error;

    fn make_config() -> MotorConfig {
        MotorConfig {
            name: heapless::String::try_from("test").unwrap(),
            steps_per_revolution: 200,
            microsteps: Microsteps::FULL,
            distance_per_revolution: 1.0,
            min_speed: Rpm(0.1),
            max_speed: Rpm(600.0),
            max_accel: RpmPerSec(100.0),
            max_decel: RpmPerSec(100.0),
            limits: None,
        }
    }

    #[test]
    fn test_distance_to_steps_baseline() {
        // 200 steps/rev, 1.0 dist/rev, full step: half a unit is 100 steps.
        let core = StepperCore::from_config(&make_config());
        assert_eq!(core.distance_to_steps(Distance(0.5)), Steps(100));
    }

    #[test]
    fn test_distance_to_steps_after_microstep_change() {
        let mut core = StepperCore::from_config(&make_config());
        core.set_microsteps(Microsteps::QUARTER);
        assert_eq!(core.distance_to_steps(Distance(0.5)), Steps(400));
    }

    #[test]
    fn test_round_trip_within_one_step() {
        let core = StepperCore::from_config(&make_config());
        for d in [0.0, 0.1, 0.333, 0.5, 1.7, -2.25] {
            let back = core.steps_to_distance(core.distance_to_steps(Distance(d)));
            let one_step = 1.0 / core.steps_per_unit();
            assert!(
                (back.0 - d).abs() <= one_step,
                "round trip of {} drifted to {}",
                d,
                back.0
            );
        }
    }

    #[test]
    fn test_rounds_to_nearest_step() {
        let core = StepperCore::from_config(&make_config());
        // 0.5024 units * 200 steps/unit = 100.48 -> 100
        assert_eq!(core.distance_to_steps(Distance(0.5024)), Steps(100));
        // 0.5026 * 200 = 100.52 -> 101
        assert_eq!(core.distance_to_steps(Distance(0.5026)), Steps(101));
    }

    #[test]
    fn test_physical_speed_independent_of_microsteps() {
        let mut core = StepperCore::from_config(&make_config());

        let full_rate = core.rpm_to_steps_per_sec(Rpm(60.0));
        core.set_microsteps(Microsteps::EIGHTH);
        let eighth_rate = core.rpm_to_steps_per_sec(Rpm(60.0));

        // Same physical speed needs eight times the microstep rate.
        assert!((eighth_rate - full_rate * 8.0).abs() < 0.01);
        assert!((core.steps_per_sec_to_rpm(eighth_rate).0 - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_set_microsteps_idempotent() {
        let mut core = StepperCore::from_config(&make_config());
        core.set_target_steps(Steps(100));

        core.set_microsteps(Microsteps::QUARTER);
        core.set_microsteps(Microsteps::QUARTER);
        core.set_microsteps(Microsteps::QUARTER);

        assert_eq!(core.target_steps(), Steps(400));
        assert_eq!(core.steps_to_distance(core.target_steps()), Distance(0.5));
    }

    #[test]
    fn test_set_microsteps_order_independent() {
        let mut a = StepperCore::from_config(&make_config());
        let mut b = StepperCore::from_config(&make_config());
        a.set_target_steps(Steps(200));
        b.set_target_steps(Steps(200));

        a.set_microsteps(Microsteps::HALF);
        a.set_microsteps(Microsteps::EIGHTH);

        b.set_microsteps(Microsteps::EIGHTH);

        assert_eq!(a.target_steps(), b.target_steps());
        assert_eq!(a.steps_per_unit(), b.steps_per_unit());
    }

    #[test]
    fn test_check_speed_bounds() {
        let core = StepperCore::from_config(&make_config());

        assert!(core.check_speed(Rpm(60.0)).is_ok());
        assert!(core.check_speed(Rpm(-60.0)).is_ok());
        assert!(matches!(
            core.check_speed(Rpm(601.0)),
            Err(Error::Range(RangeError::SpeedOutOfRange { .. }))
        ));
        assert!(matches!(
            core.check_speed(Rpm(0.05)),
            Err(Error::Range(RangeError::SpeedOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_check_target_no_limits() {
        let core = StepperCore::from_config(&make_config());
        assert_eq!(core.check_target(Steps(1_000_000)).unwrap(), Steps(1_000_000));
    }

    #[test]
    fn test_check_target_reject() {
        let mut config = make_config();
        config.limits = Some(SoftLimits::new(
            Distance(0.0),
            Distance(2.0),
            LimitPolicy::Reject,
        ));
        let core = StepperCore::from_config(&config);

        assert!(core.check_target(Steps(400)).is_ok());
        assert!(matches!(
            core.check_target(Steps(401)),
            Err(Error::Range(RangeError::PositionOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_check_target_follows_microstep_factor() {
        let mut config = make_config();
        config.limits = Some(SoftLimits::new(
            Distance(0.0),
            Distance(2.0),
            LimitPolicy::Reject,
        ));
        let mut core = StepperCore::from_config(&config);

        // 401 steps exceeds 2.0 units at full step, but is well inside at 1/4.
        assert!(core.check_target(Steps(401)).is_err());
        core.set_microsteps(Microsteps::QUARTER);
        assert!(core.check_target(Steps(401)).is_ok());
    }

    #[test]
    fn test_check_target_clamp() {
        let mut config = make_config();
        config.limits = Some(SoftLimits::new(
            Distance(0.0),
            Distance(2.0),
            LimitPolicy::Clamp,
        ));
        let core = StepperCore::from_config(&config);

        assert_eq!(core.check_target(Steps(900)).unwrap(), Steps(400));
    }

    #[test]
    fn test_enabled_bookkeeping() {
        let mut core = StepperCore::from_config(&make_config());
        assert!(!core.enabled());
        core.set_enabled(true);
        assert!(core.enabled());
        core.set_enabled(false);
        assert!(!core.enabled());
    }
}
