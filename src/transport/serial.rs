//! TTL serial transport for the Tic controller.
//!
//! Generic over split embedded-hal-nb serial halves (blocking via
//! `nb::block!`). Supports the compact protocol (`[opcode, payload...]`) and
//! the multi-device protocol (`[0xAA, device, opcode & 0x7F, payload...]`),
//! with optional CRC-7 appended to every command and verified on every
//! response. A checksum mismatch on a response is retried exactly once
//! before surfacing as a protocol error.

use embedded_hal_nb::serial::{Read, Write};

use crate::error::{CommError, ProtocolError, Result};
use crate::protocol::{crc7, encode_serial_32, MAX_FRAME_LEN};

/// Serial transport adapter.
///
/// Owns both UART halves exclusively; [`release`](TicSerial::release) returns
/// them when the driver is torn down.
pub struct TicSerial<TX, RX> {
    tx: TX,
    rx: RX,
    device_number: Option<u8>,
    crc_enabled: bool,
}

impl<TX, RX> TicSerial<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    /// Create a compact-protocol transport without CRC.
    pub fn new(tx: TX, rx: RX) -> Self {
        Self {
            tx,
            rx,
            device_number: None,
            crc_enabled: false,
        }
    }

    /// Address a specific device on a shared serial bus.
    pub fn device_number(mut self, device: u8) -> Self {
        self.device_number = Some(device);
        self
    }

    /// Append CRC-7 to every command and verify it on every response.
    ///
    /// The controller must have CRC enabled for both directions in its
    /// nonvolatile settings.
    pub fn with_crc(mut self) -> Self {
        self.crc_enabled = true;
        self
    }

    /// Release both UART halves.
    pub fn release(self) -> (TX, RX) {
        (self.tx, self.rx)
    }

    fn frame(&self, op: u8, payload: &[u8]) -> heapless::Vec<u8, MAX_FRAME_LEN> {
        let mut frame = heapless::Vec::new();
        match self.device_number {
            Some(device) => {
                let _ = frame.push(0xAA);
                let _ = frame.push(device);
                let _ = frame.push(op & 0x7F);
            }
            None => {
                let _ = frame.push(op);
            }
        }
        let _ = frame.extend_from_slice(payload);
        if self.crc_enabled {
            let crc = crc7(&frame);
            let _ = frame.push(crc);
        }
        frame
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        for &byte in frame {
            nb::block!(self.tx.write(byte)).map_err(|_| CommError::Write)?;
        }
        nb::block!(self.tx.flush()).map_err(|_| CommError::Write)?;
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        for slot in buf.iter_mut() {
            *slot = nb::block!(self.rx.read()).map_err(|_| CommError::Read)?;
        }
        Ok(())
    }
}

impl<TX, RX> super::TicTransport for TicSerial<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    fn quick(&mut self, op: u8) -> Result<()> {
        let frame = self.frame(op, &[]);
        self.send(&frame)
    }

    fn write7(&mut self, op: u8, value: u8) -> Result<()> {
        let frame = self.frame(op, &[value & 0x7F]);
        self.send(&frame)
    }

    fn write32(&mut self, op: u8, value: i32) -> Result<()> {
        let frame = self.frame(op, &encode_serial_32(value));
        self.send(&frame)
    }

    fn block_read(&mut self, op: u8, offset: u8, buf: &mut [u8]) -> Result<()> {
        let frame = self.frame(op, &[offset, buf.len() as u8]);
        // One retry, and only for a response checksum mismatch.
        let mut retries_left = if self.crc_enabled { 1u8 } else { 0 };
        loop {
            self.send(&frame)?;
            self.receive(buf)?;
            if !self.crc_enabled {
                return Ok(());
            }
            let actual = nb::block!(self.rx.read()).map_err(|_| CommError::Read)?;
            let expected = crc7(buf);
            if actual == expected {
                return Ok(());
            }
            if retries_left == 0 {
                return Err(ProtocolError::ChecksumMismatch { expected, actual }.into());
            }
            retries_left -= 1;
        }
    }
}
