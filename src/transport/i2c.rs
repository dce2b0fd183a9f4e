//! I2C transport for the Tic controller.
//!
//! Generic over any embedded-hal 1.0 I2C bus. Commands are direct register
//! writes (`[opcode, payload...]`); block reads are an `[opcode, offset]`
//! write followed by a separate N-byte read, matching the controller's
//! documented transaction pairs.

use embedded_hal::i2c::I2c;

use crate::error::{CommError, Result};
use crate::protocol::encode_i2c_32;

/// Default 7-bit bus address of a Tic controller.
pub const DEFAULT_ADDRESS: u8 = 0x0E;

/// I2C transport adapter.
///
/// Owns the bus handle exclusively; [`release`](TicI2c::release) returns it
/// when the driver is torn down.
#[derive(Debug)]
pub struct TicI2c<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> TicI2c<I2C> {
    /// Create a transport using the default controller address.
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Create a transport for a controller at a custom bus address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The controller's bus address.
    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> super::TicTransport for TicI2c<I2C> {
    fn quick(&mut self, op: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[op])
            .map_err(|_| CommError::Write.into())
    }

    fn write7(&mut self, op: u8, value: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[op, value])
            .map_err(|_| CommError::Write.into())
    }

    fn write32(&mut self, op: u8, value: i32) -> Result<()> {
        let payload = encode_i2c_32(value);
        let frame = [op, payload[0], payload[1], payload[2], payload[3]];
        self.i2c
            .write(self.address, &frame)
            .map_err(|_| CommError::Write.into())
    }

    fn block_read(&mut self, op: u8, offset: u8, buf: &mut [u8]) -> Result<()> {
        self.i2c
            .write(self.address, &[op, offset])
            .map_err(|_| CommError::Write)?;
        self.i2c
            .read(self.address, buf)
            .map_err(|_| CommError::Read.into())
    }
}
