//! # tic-motion
//!
//! Hardware abstraction for stepper motors driven by Pololu Tic controllers,
//! `no_std`-first with an optional `std` layer for TOML configuration files.
//!
//! The crate splits into three layers:
//!
//! - [`config`]: motor parameters, engineering units, and soft limits,
//!   loadable from TOML or built in code.
//! - [`transport`]: the Tic wire protocol over I2C ([`TicI2c`]) or TTL
//!   serial ([`TicSerial`]), behind the [`TicTransport`] trait.
//! - [`motor`]: unit conversions ([`StepperCore`]) and the driver itself
//!   ([`TicStepper`]), programmed against the [`MotorDriver`] contract.
//!
//! Commands are validated locally before anything reaches the bus; a
//! rejected command leaves hardware and cached state untouched. A transport
//! failure latches the driver in a fault state that every later command
//! reports until an explicit reinitialization.
//!
//! ## Example
//!
//! ```no_run
//! use tic_motion::{MotorDriver, TicI2c, TicStepperBuilder};
//! use tic_motion::config::{Distance, Rpm};
//! # fn demo<I2C: embedded_hal::i2c::I2c>(i2c: I2C) -> Result<(), tic_motion::Error> {
//! let mut motor = TicStepperBuilder::new(TicI2c::new(i2c))
//!     .steps_per_revolution(200)
//!     .distance_per_revolution(1.0)
//!     .max_speed(Rpm(600.0))
//!     .build()?;
//!
//! motor.enable()?;
//! motor.move_to(Distance(2.5))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `std` (default): TOML configuration loading and `std::error::Error`
//!   impls.
//! - `alloc`: reserved for collections beyond the `heapless` defaults.
//! - `defmt`: `defmt::Format` impls for embedded logging.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

pub mod config;
pub mod error;
pub mod motor;
pub mod protocol;
pub mod transport;

pub use config::{MotorConfig, SystemConfig};
pub use error::{Error, Result};
pub use motor::{
    DriveState, HomeDirection, MotorDriver, StepperCore, TicStepper, TicStepperBuilder,
};
pub use transport::{TicI2c, TicSerial, TicTransport};

#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
