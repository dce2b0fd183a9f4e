//! Pololu Tic stepper driver.
//!
//! Maps the abstract motor contract onto the Tic command/variable set over
//! any [`TicTransport`]. The controller executes motion on its own once
//! commanded; this driver issues short synchronous command writes and decodes
//! status reads.
//!
//! Local caches (target position, commanded speed) always reflect the last
//! *acknowledged* command. Any transport failure latches the driver in
//! [`DriveState::Faulted`]; every subsequent command fails fast until
//! [`reinitialize`](TicStepper::reinitialize) is called. The controller must
//! be preconfigured over USB; only runtime variables are written here.

use crate::config::units::{Distance, Microsteps, Rpm, RpmPerSec, Steps};
use crate::config::{validate_motor, MotorConfig};
use crate::error::{ConfigError, Error, RangeError, Result, StateError};
use crate::protocol::{
    cmd, decode_i32, decode_u16, setting, step_mode_code, var, MISC_FLAG_POSITION_UNCERTAIN,
};
use crate::transport::TicTransport;

use super::core::StepperCore;
use super::state::DriveState;
use super::MotorDriver;

/// Native velocity unit: microsteps per 10,000 seconds.
const VELOCITY_SCALE: f32 = 10_000.0;

/// Native acceleration unit: microsteps per second per 100 seconds.
const ACCEL_SCALE: f32 = 100.0;

/// Homing direction, resolved against the controller's limit switch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomeDirection {
    /// Toward the reverse limit switch.
    Reverse,
    /// Toward the forward limit switch.
    Forward,
}

impl HomeDirection {
    fn name(self) -> &'static str {
        match self {
            HomeDirection::Reverse => "reverse",
            HomeDirection::Forward => "forward",
        }
    }
}

/// Driver for a Pololu Tic stepper controller.
///
/// Generic over the transport; construct with a [`TicI2c`](crate::TicI2c) or
/// [`TicSerial`](crate::TicSerial) adapter, chosen once at creation.
#[derive(Debug)]
pub struct TicStepper<T: TicTransport> {
    transport: T,
    core: StepperCore,
    state: DriveState,
    max_accel: RpmPerSec,
    max_decel: RpmPerSec,
    accel: Option<RpmPerSec>,
    decel: Option<RpmPerSec>,
    // True while the outstanding motion command is a position move, so a
    // microstep change knows whether re-issuing the target is safe.
    position_move: bool,
}

impl<T: TicTransport> TicStepper<T> {
    /// Create a driver bound to one transport and initialize the controller.
    ///
    /// Validates the configuration, resets the controller, and pushes the
    /// configured step mode and speed cap. The driver starts in
    /// [`DriveState::Disabled`] with the coils de-energized.
    pub fn new(transport: T, config: &MotorConfig) -> Result<Self> {
        validate_motor(config.name.as_str(), config)?;
        // Reject a config the Tic cannot encode before touching the bus.
        let step_mode = step_mode_code(config.microsteps.value())
            .ok_or(ConfigError::UnsupportedStepMode(config.microsteps.value()))?;

        let mut driver = Self {
            transport,
            core: StepperCore::from_config(config),
            state: DriveState::Uninitialized,
            max_accel: config.max_accel,
            max_decel: config.max_decel,
            accel: None,
            decel: None,
            position_move: false,
        };
        driver.initialize(step_mode)?;
        Ok(driver)
    }

    fn initialize(&mut self, step_mode: u8) -> Result<()> {
        let seq = (|| {
            self.transport.quick(cmd::RESET)?;
            self.transport.write7(cmd::SET_STEP_MODE, step_mode)?;
            let native = self.native_velocity(self.core.rpm_to_steps_per_sec(self.core.max_speed()));
            self.transport.write32(cmd::SET_MAX_SPEED, native)
        })();
        match seq {
            Ok(()) => {
                self.core.set_target_steps(Steps(0));
                self.core.set_commanded_speed(Rpm(0.0));
                self.core.set_enabled(false);
                self.accel = None;
                self.decel = None;
                self.position_move = false;
                self.state = DriveState::Disabled;
                Ok(())
            }
            Err(e) => {
                self.state = DriveState::Faulted;
                Err(e)
            }
        }
    }

    /// Recover from [`DriveState::Faulted`].
    ///
    /// Resets the controller and re-pushes step mode and speed cap; the only
    /// exit from a fault. Local caches are cleared; the reset returns the
    /// controller to position 0, de-energized.
    pub fn reinitialize(&mut self) -> Result<()> {
        let step_mode = step_mode_code(self.core.microsteps().value())
            .ok_or(ConfigError::UnsupportedStepMode(self.core.microsteps().value()))?;
        self.initialize(step_mode)
    }

    /// Current driver state.
    #[inline]
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Current microstep divisor.
    #[inline]
    pub fn microsteps(&self) -> Microsteps {
        self.core.microsteps()
    }

    /// Last acknowledged target position.
    #[inline]
    pub fn target_steps(&self) -> Steps {
        self.core.target_steps()
    }

    /// Last acknowledged acceleration command, if any.
    #[inline]
    pub fn accel(&self) -> Option<RpmPerSec> {
        self.accel
    }

    /// Last acknowledged deceleration command, if any.
    #[inline]
    pub fn decel(&self) -> Option<RpmPerSec> {
        self.decel
    }

    /// Change the microstep divisor.
    ///
    /// Validates both the divisor and its Tic encodability before any
    /// transport write. On success the conversion factors are swapped
    /// atomically with the setting, and every controller register holding a
    /// value in microstep units is re-issued at the new factor: the speed
    /// cap, any acknowledged accel/decel limits, and the target position of
    /// an in-flight move. The physical meaning of all of them is unchanged.
    pub fn set_microsteps(&mut self, divisor: u16) -> Result<()> {
        self.ensure_ready()?;
        let microsteps = Microsteps::new(divisor)?;
        let code =
            step_mode_code(divisor).ok_or(ConfigError::UnsupportedStepMode(divisor))?;

        let res = self.transport.write7(cmd::SET_STEP_MODE, code);
        self.fault_guard(res)?;
        self.core.set_microsteps(microsteps);

        let native = self.native_velocity(self.core.rpm_to_steps_per_sec(self.core.max_speed()));
        let res = self.transport.write32(cmd::SET_MAX_SPEED, native);
        self.fault_guard(res)?;
        if let Some(accel) = self.accel {
            let res = self.transport.write32(cmd::SET_MAX_ACCEL, self.native_accel(accel));
            self.fault_guard(res)?;
        }
        if let Some(decel) = self.decel {
            let res = self.transport.write32(cmd::SET_MAX_DECEL, self.native_accel(decel));
            self.fault_guard(res)?;
        }
        // Only position moves can be restated; a velocity or homing command
        // must not be clobbered by a target write.
        if self.state == DriveState::EnabledMoving && self.position_move {
            let target = self.core.target_steps();
            let res = self.transport.write32(cmd::SET_TARGET_POSITION, target.0);
            self.fault_guard(res)?;
        }
        Ok(())
    }

    /// Set the acceleration limit, in RPM per second.
    pub fn set_accel(&mut self, accel: RpmPerSec) -> Result<()> {
        self.ensure_ready()?;
        if accel.0 <= 0.0 || accel.0 > self.max_accel.0 {
            return Err(RangeError::AccelOutOfRange {
                requested: accel.0,
                max: self.max_accel.0,
            }
            .into());
        }
        let native = self.native_accel(accel);
        let res = self.transport.write32(cmd::SET_MAX_ACCEL, native);
        self.fault_guard(res)?;
        self.accel = Some(accel);
        Ok(())
    }

    /// Set the deceleration limit, in RPM per second.
    pub fn set_decel(&mut self, decel: RpmPerSec) -> Result<()> {
        self.ensure_ready()?;
        if decel.0 <= 0.0 || decel.0 > self.max_decel.0 {
            return Err(RangeError::DecelOutOfRange {
                requested: decel.0,
                max: self.max_decel.0,
            }
            .into());
        }
        let native = self.native_accel(decel);
        let res = self.transport.write32(cmd::SET_MAX_DECEL, native);
        self.fault_guard(res)?;
        self.decel = Some(decel);
        Ok(())
    }

    /// Move to an absolute position in steps.
    pub fn move_to_steps(&mut self, target: Steps) -> Result<()> {
        self.ensure_ready()?;
        self.ensure_enabled()?;
        let target = self.core.check_target(target)?;

        let res = self.transport.write32(cmd::SET_TARGET_POSITION, target.0);
        self.fault_guard(res)?;
        self.core.set_target_steps(target);
        self.position_move = true;
        self.state = DriveState::EnabledMoving;
        Ok(())
    }

    /// Move by a relative number of steps from the live position.
    pub fn move_rel_steps(&mut self, delta: Steps) -> Result<()> {
        let current = self.position_steps()?;
        self.move_to_steps(current + delta)
    }

    /// Move by a relative distance from the live position.
    pub fn move_rel(&mut self, delta: Distance) -> Result<()> {
        let steps = self.core.distance_to_steps(delta);
        self.move_rel_steps(steps)
    }

    /// Live position in steps, read from the controller.
    pub fn position_steps(&mut self) -> Result<Steps> {
        self.ensure_ready()?;
        Ok(Steps(self.read_i32_var(var::CURRENT_POSITION.0)?))
    }

    /// Home toward a limit switch.
    ///
    /// Fails with `LimitSwitchNotConfigured` if the controller has no switch
    /// mapped in that direction (checked via a settings read, so a homing
    /// command is never issued blind).
    pub fn home(&mut self, direction: HomeDirection) -> Result<()> {
        self.ensure_ready()?;
        self.ensure_enabled()?;

        let offset = match direction {
            HomeDirection::Forward => setting::LIMIT_SWITCH_FWD,
            HomeDirection::Reverse => setting::LIMIT_SWITCH_REV,
        };
        let mut buf = [0u8; 1];
        let res = self.transport.block_read(cmd::GET_SETTING, offset, &mut buf);
        self.fault_guard(res)?;
        if buf[0] == 0 {
            return Err(ConfigError::LimitSwitchNotConfigured(direction.name()).into());
        }

        let data = match direction {
            HomeDirection::Reverse => 0,
            HomeDirection::Forward => 1,
        };
        let res = self.transport.write7(cmd::GO_HOME, data);
        self.fault_guard(res)?;
        self.position_move = false;
        self.state = DriveState::EnabledMoving;
        Ok(())
    }

    /// Whether the controller is certain of its position.
    ///
    /// The "position uncertain" flag is set after energizing or hitting a
    /// limit switch; homing clears it.
    pub fn is_homed(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        let flags = self.read_u8_var(var::MISC_FLAGS1.0)?;
        Ok(flags & MISC_FLAG_POSITION_UNCERTAIN == 0)
    }

    /// Pet the controller's command timeout watchdog.
    ///
    /// Call periodically when no other command flows, or the controller will
    /// halt on its own.
    pub fn reset_command_timeout(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let res = self.transport.quick(cmd::RESET_COMMAND_TIMEOUT);
        self.fault_guard(res)
    }

    /// Clear a latched driver error on the controller.
    pub fn clear_driver_error(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let res = self.transport.quick(cmd::CLEAR_DRIVER_ERROR);
        self.fault_guard(res)
    }

    /// Supply voltage at the controller, in millivolts.
    pub fn vin_voltage(&mut self) -> Result<u16> {
        self.ensure_ready()?;
        let mut buf = [0u8; 2];
        let res = self
            .transport
            .block_read(cmd::GET_VARIABLE, var::VIN_VOLTAGE.0, &mut buf);
        self.fault_guard(res)?;
        Ok(decode_u16(&buf))
    }

    /// Tear the driver down: stop, disable, then release the transport.
    ///
    /// The sequence runs exactly once, before the transport handle is handed
    /// back, so the motor is never left running under an orphaned command.
    /// If a teardown command fails, the transport is still returned alongside
    /// the error. A faulted driver skips the commands (the bus is already
    /// suspect) and just releases the transport.
    pub fn shutdown(mut self) -> core::result::Result<T, (T, Error)> {
        if self.state.is_faulted() || self.state == DriveState::Uninitialized {
            return Ok(self.transport);
        }
        let seq = (|| {
            self.transport.quick(cmd::HALT_AND_HOLD)?;
            self.transport.quick(cmd::ENTER_SAFE_START)?;
            self.transport.quick(cmd::DEENERGIZE)
        })();
        match seq {
            Ok(()) => Ok(self.transport),
            Err(e) => Err((self.transport, e)),
        }
    }

    fn native_velocity(&self, steps_per_sec: f32) -> i32 {
        libm::roundf(steps_per_sec * VELOCITY_SCALE) as i32
    }

    fn native_accel(&self, accel: RpmPerSec) -> i32 {
        let steps_per_sec2 = self.core.rpm_to_steps_per_sec(Rpm(accel.0));
        libm::roundf(steps_per_sec2 * ACCEL_SCALE) as i32
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state.is_faulted() {
            return Err(StateError::Faulted.into());
        }
        Ok(())
    }

    fn ensure_enabled(&self) -> Result<()> {
        if !self.core.enabled() {
            return Err(StateError::NotEnabled.into());
        }
        Ok(())
    }

    fn fault_guard<R>(&mut self, result: Result<R>) -> Result<R> {
        if matches!(result, Err(Error::Comm(_)) | Err(Error::Protocol(_))) {
            self.state = DriveState::Faulted;
        }
        result
    }

    fn read_i32_var(&mut self, offset: u8) -> Result<i32> {
        let mut buf = [0u8; 4];
        let res = self.transport.block_read(cmd::GET_VARIABLE, offset, &mut buf);
        self.fault_guard(res)?;
        Ok(decode_i32(&buf))
    }

    fn read_u8_var(&mut self, offset: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        let res = self.transport.block_read(cmd::GET_VARIABLE, offset, &mut buf);
        self.fault_guard(res)?;
        Ok(buf[0])
    }
}

impl<T: TicTransport> MotorDriver for TicStepper<T> {
    /// Energize the coils and exit safe start, in that order.
    fn enable(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let res = self.transport.quick(cmd::ENERGIZE);
        self.fault_guard(res)?;
        let res = self.transport.quick(cmd::EXIT_SAFE_START);
        self.fault_guard(res)?;
        self.core.set_enabled(true);
        if self.state == DriveState::Disabled {
            self.state = DriveState::EnabledIdle;
        }
        Ok(())
    }

    /// Stop if moving, then enter safe start and de-energize.
    fn disable(&mut self) -> Result<()> {
        self.ensure_ready()?;
        if self.state == DriveState::EnabledMoving {
            self.stop()?;
        }
        let res = self.transport.quick(cmd::ENTER_SAFE_START);
        self.fault_guard(res)?;
        let res = self.transport.quick(cmd::DEENERGIZE);
        self.fault_guard(res)?;
        self.core.set_enabled(false);
        self.state = DriveState::Disabled;
        Ok(())
    }

    /// Halt and hold the current position. Idempotent; position is kept.
    fn stop(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let res = self.transport.quick(cmd::HALT_AND_HOLD);
        self.fault_guard(res)?;
        self.core.set_commanded_speed(Rpm(0.0));
        self.position_move = false;
        if self.state == DriveState::EnabledMoving {
            self.state = DriveState::EnabledIdle;
        }
        Ok(())
    }

    /// Live motion query: reads the controller's current velocity.
    ///
    /// Overrides the commanded-speed default because completed moves and
    /// external disturbances change real motion asynchronously from the
    /// commands issued here.
    fn is_moving(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        let velocity = self.read_i32_var(var::CURRENT_VELOCITY.0)?;
        let moving = velocity != 0;
        if self.state.is_enabled() {
            self.state = if moving {
                DriveState::EnabledMoving
            } else {
                DriveState::EnabledIdle
            };
        }
        Ok(moving)
    }

    /// Move to an absolute position in distance units.
    fn move_to(&mut self, target: Distance) -> Result<()> {
        let steps = self.core.distance_to_steps(target);
        self.move_to_steps(steps)
    }

    /// Run continuously at a signed speed.
    fn move_at_speed(&mut self, speed: Rpm) -> Result<()> {
        self.ensure_ready()?;
        self.ensure_enabled()?;
        let speed = self.core.check_speed(speed)?;

        let native = self.native_velocity(self.core.rpm_to_steps_per_sec(speed));
        let res = self.transport.write32(cmd::SET_TARGET_VELOCITY, native);
        self.fault_guard(res)?;
        self.core.set_commanded_speed(speed);
        self.position_move = false;
        self.state = DriveState::EnabledMoving;
        Ok(())
    }

    /// Declare the current physical position to be zero.
    fn zero(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let res = self.transport.write32(cmd::HALT_AND_SET_POSITION, 0);
        self.fault_guard(res)?;
        self.core.set_target_steps(Steps(0));
        self.core.set_commanded_speed(Rpm(0.0));
        self.position_move = false;
        if self.state == DriveState::EnabledMoving {
            self.state = DriveState::EnabledIdle;
        }
        Ok(())
    }

    /// Live position in distance units.
    fn position(&mut self) -> Result<Distance> {
        let steps = self.position_steps()?;
        Ok(self.core.steps_to_distance(steps))
    }

    /// Live speed in RPM, read from the controller.
    fn speed(&mut self) -> Result<Rpm> {
        self.ensure_ready()?;
        let native = self.read_i32_var(var::CURRENT_VELOCITY.0)?;
        Ok(self.core.steps_per_sec_to_rpm(native as f32 / VELOCITY_SCALE))
    }

    /// Last acknowledged commanded speed.
    fn commanded_speed(&self) -> Rpm {
        self.core.commanded_speed()
    }
}
