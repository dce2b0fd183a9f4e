//! Motor drivers and the shared driver contract.
//!
//! [`StepperCore`] carries unit conversions and cached command state;
//! [`MotorDriver`] is the controller-independent contract callers program
//! against; [`TicStepper`] implements it for the Pololu Tic family.

mod builder;
mod core;
mod state;
mod tic;

pub use builder::TicStepperBuilder;
pub use core::StepperCore;
pub use state::DriveState;
pub use tic::{HomeDirection, TicStepper};

use crate::config::units::{Distance, Rpm};
use crate::error::Result;

/// Controller-independent motor operations.
///
/// Every command validates locally before anything reaches the bus, so a
/// rejected command leaves both the hardware and the cached state untouched.
pub trait MotorDriver {
    /// Energize the motor and allow motion commands.
    fn enable(&mut self) -> Result<()>;

    /// Stop any motion, then de-energize the motor.
    fn disable(&mut self) -> Result<()>;

    /// Stop motion while keeping the motor energized and holding.
    fn stop(&mut self) -> Result<()>;

    /// Whether the motor is currently in motion.
    ///
    /// The default answers from the last commanded speed. Drivers that can
    /// query live velocity from the controller should override it.
    fn is_moving(&mut self) -> Result<bool> {
        Ok(self.commanded_speed().0 != 0.0)
    }

    /// Move to an absolute position in distance units.
    fn move_to(&mut self, target: Distance) -> Result<()>;

    /// Run continuously at a signed speed in RPM.
    fn move_at_speed(&mut self, speed: Rpm) -> Result<()>;

    /// Declare the current physical position to be zero.
    fn zero(&mut self) -> Result<()>;

    /// Current position in distance units.
    fn position(&mut self) -> Result<Distance>;

    /// Current speed in RPM.
    fn speed(&mut self) -> Result<Rpm>;

    /// Last acknowledged commanded speed in RPM.
    fn commanded_speed(&self) -> Rpm;
}
