//! Transport adapters for the Tic controller.
//!
//! The driver core only depends on the [`TicTransport`] contract; the I2C and
//! serial implementations frame the same logical operations differently but
//! produce equivalent effects on the controller.

mod i2c;
mod serial;

pub use i2c::TicI2c;
pub use serial::TicSerial;

use crate::error::Result;

/// Byte-level command contract consumed by the Tic driver.
///
/// All range and configuration validation happens above this trait;
/// implementations only frame and move bytes. Every method blocks until the
/// bus acknowledges or its own timeout fires, surfacing either as
/// [`CommError`](crate::error::CommError) or
/// [`ProtocolError`](crate::error::ProtocolError).
pub trait TicTransport {
    /// Issue a quick command with no payload.
    fn quick(&mut self, op: u8) -> Result<()>;

    /// Issue a command with a single 7-bit payload byte.
    fn write7(&mut self, op: u8, value: u8) -> Result<()>;

    /// Issue a command with a signed 32-bit payload.
    fn write32(&mut self, op: u8, value: i32) -> Result<()>;

    /// Block-read `buf.len()` bytes starting at `offset`, using a variable or
    /// setting read opcode.
    fn block_read(&mut self, op: u8, offset: u8, buf: &mut [u8]) -> Result<()>;
}
