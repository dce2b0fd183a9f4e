//! Tic controller wire protocol.
//!
//! Command opcodes, variable offsets, and the pure encoding helpers shared by
//! the I2C and serial transports. The controller must be preconfigured over
//! USB; only runtime variables can be changed over I2C or serial.
//!
//! Command reference: <https://www.pololu.com/docs/0J71/8>
//! Variable reference: <https://www.pololu.com/docs/0J71/7>

/// Command opcodes.
pub mod cmd {
    /// Set target position, signed 32-bit microsteps.
    pub const SET_TARGET_POSITION: u8 = 0xE0;
    /// Set target velocity, signed 32-bit microsteps per 10,000 s.
    pub const SET_TARGET_VELOCITY: u8 = 0xE3;
    /// Halt and set the current position, signed 32-bit microsteps.
    pub const HALT_AND_SET_POSITION: u8 = 0xEC;
    /// Halt and hold the current position.
    pub const HALT_AND_HOLD: u8 = 0x89;
    /// Start homing: 0 = reverse, 1 = forward.
    pub const GO_HOME: u8 = 0x97;
    /// Reset the command timeout watchdog.
    pub const RESET_COMMAND_TIMEOUT: u8 = 0x8C;
    /// De-energize the motor coils.
    pub const DEENERGIZE: u8 = 0x86;
    /// Energize the motor coils.
    pub const ENERGIZE: u8 = 0x85;
    /// Exit safe start, allowing motion commands.
    pub const EXIT_SAFE_START: u8 = 0x83;
    /// Enter safe start.
    pub const ENTER_SAFE_START: u8 = 0x8F;
    /// Reset the controller.
    pub const RESET: u8 = 0xB0;
    /// Clear a latched driver error.
    pub const CLEAR_DRIVER_ERROR: u8 = 0x8A;
    /// Set max speed, 32-bit microsteps per 10,000 s.
    pub const SET_MAX_SPEED: u8 = 0xE6;
    /// Set starting speed, 32-bit microsteps per 10,000 s.
    pub const SET_STARTING_SPEED: u8 = 0xE5;
    /// Set max acceleration, 32-bit microsteps per 100 s².
    pub const SET_MAX_ACCEL: u8 = 0xEA;
    /// Set max deceleration, 32-bit microsteps per 100 s².
    pub const SET_MAX_DECEL: u8 = 0xE9;
    /// Set step mode, 7-bit: microstep divisor = 2^n.
    pub const SET_STEP_MODE: u8 = 0x94;
    /// Set current limit, 7-bit.
    pub const SET_CURRENT_LIMIT: u8 = 0x91;
    /// Block read of a runtime variable.
    pub const GET_VARIABLE: u8 = 0xA1;
    /// Block read of a runtime variable, clearing sticky error bits.
    pub const GET_VARIABLE_AND_CLEAR_ERRORS: u8 = 0xA2;
    /// Block read of a nonvolatile setting.
    pub const GET_SETTING: u8 = 0xA8;
}

/// Runtime variable offsets and widths, readable with [`cmd::GET_VARIABLE`].
pub mod var {
    /// Operation state, 1 byte.
    pub const OPERATION_STATE: (u8, usize) = (0x00, 1);
    /// Misc flags, 1 byte. Bit 1 is "position uncertain".
    pub const MISC_FLAGS1: (u8, usize) = (0x01, 1);
    /// Error status bitmask, 2 bytes.
    pub const ERROR_STATUS: (u8, usize) = (0x02, 2);
    /// Errors occurred bitmask, 4 bytes.
    pub const ERRORS_OCCURRED: (u8, usize) = (0x04, 4);
    /// Target position, 4 bytes signed.
    pub const TARGET_POSITION: (u8, usize) = (0x0A, 4);
    /// Target velocity, 4 bytes signed.
    pub const TARGET_VELOCITY: (u8, usize) = (0x0E, 4);
    /// Max speed, 4 bytes.
    pub const MAX_SPEED: (u8, usize) = (0x16, 4);
    /// Max acceleration, 4 bytes.
    pub const MAX_ACCEL: (u8, usize) = (0x1A, 4);
    /// Max deceleration, 4 bytes.
    pub const MAX_DECEL: (u8, usize) = (0x1E, 4);
    /// Current position, 4 bytes signed.
    pub const CURRENT_POSITION: (u8, usize) = (0x22, 4);
    /// Current velocity, 4 bytes signed.
    pub const CURRENT_VELOCITY: (u8, usize) = (0x26, 4);
    /// VIN voltage, 2 bytes, millivolts.
    pub const VIN_VOLTAGE: (u8, usize) = (0x33, 2);
    /// Uptime, 4 bytes, milliseconds.
    pub const UPTIME: (u8, usize) = (0x35, 4);
    /// Step mode, 1 byte: divisor = 2^n.
    pub const STEP_MODE: (u8, usize) = (0x49, 1);
    /// Current limit, 1 byte.
    pub const CURRENT_LIMIT: (u8, usize) = (0x4A, 1);
}

/// Nonvolatile setting offsets, readable with [`cmd::GET_SETTING`].
pub mod setting {
    /// Forward limit switch pin map, 1 byte. Zero means not configured.
    pub const LIMIT_SWITCH_FWD: u8 = 0x5F;
    /// Reverse limit switch pin map, 1 byte. Zero means not configured.
    pub const LIMIT_SWITCH_REV: u8 = 0x60;
}

/// Misc flags bit 1: set while the controller is unsure of its position.
pub const MISC_FLAG_POSITION_UNCERTAIN: u8 = 1 << 1;

/// Maximum framed command length (device-number serial header + 32-bit
/// payload + CRC byte).
pub const MAX_FRAME_LEN: usize = 16;

/// Encode a microstep divisor as the Tic step mode code (divisor = 2^n).
///
/// The Tic encodes full step through 1/8 step; larger divisors are not
/// representable and return `None`.
pub fn step_mode_code(divisor: u16) -> Option<u8> {
    match divisor {
        1 => Some(0),
        2 => Some(1),
        4 => Some(2),
        8 => Some(3),
        _ => None,
    }
}

/// Decode a Tic step mode code back into a microstep divisor.
pub fn step_mode_divisor(code: u8) -> Option<u16> {
    match code {
        0 => Some(1),
        1 => Some(2),
        2 => Some(4),
        3 => Some(8),
        _ => None,
    }
}

/// Decode a little-endian 32-bit variable read into a signed value.
pub fn decode_i32(bytes: &[u8; 4]) -> i32 {
    i32::from_le_bytes(*bytes)
}

/// Decode a little-endian 16-bit variable read.
pub fn decode_u16(bytes: &[u8; 2]) -> u16 {
    u16::from_le_bytes(*bytes)
}

/// Encode a 32-bit value for an I2C register write (plain little-endian).
pub fn encode_i2c_32(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Encode a 32-bit value for a serial write.
///
/// Serial data bytes must keep their most significant bit clear, so the
/// value is packed as one byte carrying the four MSbs followed by four
/// 7-bit bytes, least significant first.
pub fn encode_serial_32(value: i32) -> [u8; 5] {
    let v = value as u32;
    [
        (((v >> 7) & 1) | ((v >> 14) & 2) | ((v >> 21) & 4) | ((v >> 28) & 8)) as u8,
        (v & 0x7F) as u8,
        ((v >> 8) & 0x7F) as u8,
        ((v >> 16) & 0x7F) as u8,
        ((v >> 24) & 0x7F) as u8,
    ]
}

/// CRC-7 used by the Tic serial protocol (polynomial 0x91), returned in the
/// low 7 bits.
pub fn crc7(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc ^= 0x91;
            }
            crc >>= 1;
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_mode_codes() {
        assert_eq!(step_mode_code(1), Some(0));
        assert_eq!(step_mode_code(2), Some(1));
        assert_eq!(step_mode_code(4), Some(2));
        assert_eq!(step_mode_code(8), Some(3));
        assert_eq!(step_mode_code(16), None);
        assert_eq!(step_mode_code(3), None);
    }

    #[test]
    fn test_step_mode_round_trip() {
        for divisor in [1u16, 2, 4, 8] {
            let code = step_mode_code(divisor).unwrap();
            assert_eq!(step_mode_divisor(code), Some(divisor));
        }
    }

    #[test]
    fn test_decode_i32_sign_extension() {
        // -200 in two's complement, little-endian
        assert_eq!(decode_i32(&[0x38, 0xFF, 0xFF, 0xFF]), -200);
        assert_eq!(decode_i32(&[0xC8, 0x00, 0x00, 0x00]), 200);
    }

    #[test]
    fn test_encode_i2c_32() {
        assert_eq!(encode_i2c_32(0x0403_0201), [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(encode_i2c_32(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_serial_32_positive() {
        // 200 = 0xC8: MSb of low byte set, so it moves into the MSbs byte
        let encoded = encode_serial_32(200);
        assert_eq!(encoded, [0x01, 0x48, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_serial_32_keeps_msb_clear() {
        for value in [i32::MIN, -1, 0, 1, 200, 0x7FFF_FFFF] {
            for byte in encode_serial_32(value) {
                assert_eq!(byte & 0x80, 0, "byte {:#x} has MSB set", byte);
            }
        }
    }

    #[test]
    fn test_encode_serial_32_reassembles() {
        for value in [i32::MIN, -123_456, -1, 0, 1, 987_654, i32::MAX] {
            let [msbs, b0, b1, b2, b3] = encode_serial_32(value);
            let reassembled = (b0 as u32 | ((msbs as u32 & 1) << 7))
                | ((b1 as u32 | ((msbs as u32 & 2) << 6)) << 8)
                | ((b2 as u32 | ((msbs as u32 & 4) << 5)) << 16)
                | ((b3 as u32 | ((msbs as u32 & 8) << 4)) << 24);
            assert_eq!(reassembled as i32, value);
        }
    }

    #[test]
    fn test_crc7_known_vector() {
        // Hand-computed over the exit-safe-start opcode.
        assert_eq!(crc7(&[0x83]), 0x1A);
        assert_eq!(crc7(&[]), 0x00);
    }

    #[test]
    fn test_crc7_fits_seven_bits() {
        for seed in 0u8..=255 {
            assert_eq!(crc7(&[seed, seed ^ 0x5A]) & 0x80, 0);
        }
    }
}
