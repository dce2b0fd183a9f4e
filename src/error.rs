//! Error types for tic-motion.
//!
//! Provides unified error handling across configuration, range validation,
//! driver state, and transport communication.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all tic-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Requested position, speed, or acceleration outside configured bounds
    Range(RangeError),
    /// Driver is in the wrong state for the requested operation
    State(StateError),
    /// Transport write/read failure or timeout
    Comm(CommError),
    /// Malformed or unacknowledged controller response
    Protocol(ProtocolError),
}

/// Configuration-related errors.
///
/// All of these are raised before any byte reaches the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep divisor (must be one of 1, 2, 4, 8, 16, 32)
    InvalidMicrosteps(u16),
    /// Microstep divisor valid in general but not encodable by this controller
    UnsupportedStepMode(u16),
    /// Steps per revolution must be > 0
    InvalidStepsPerRev(u16),
    /// Distance per revolution must be > 0
    InvalidDistancePerRev(f32),
    /// Invalid speed bounds (must satisfy 0 < min < max)
    InvalidSpeedBounds {
        /// Configured minimum speed in RPM
        min: f32,
        /// Configured maximum speed in RPM
        max: f32,
    },
    /// Invalid acceleration or deceleration cap (must be > 0)
    InvalidAccelCap(f32),
    /// Invalid soft limits (min must be < max)
    InvalidSoftLimits {
        /// Minimum limit value
        min: f32,
        /// Maximum limit value
        max: f32,
    },
    /// Motor name not found in configuration
    MotorNotFound(heapless::String<32>),
    /// Homing requested in a direction with no limit switch configured on
    /// the controller
    LimitSwitchNotConfigured(&'static str),
    /// Builder missing a required field
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Out-of-range command errors.
///
/// Raised before any transport call; the controller never sees the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeError {
    /// Target position outside configured soft limits
    PositionOutOfRange {
        /// Requested position in steps
        target: i32,
        /// Minimum allowed position in steps
        min: i32,
        /// Maximum allowed position in steps
        max: i32,
    },
    /// Requested speed magnitude outside configured bounds
    SpeedOutOfRange {
        /// Requested speed in RPM
        requested: f32,
        /// Minimum allowed speed in RPM
        min: f32,
        /// Maximum allowed speed in RPM
        max: f32,
    },
    /// Requested acceleration outside configured cap
    AccelOutOfRange {
        /// Requested acceleration in RPM per second
        requested: f32,
        /// Maximum allowed acceleration in RPM per second
        max: f32,
    },
    /// Requested deceleration outside configured cap
    DecelOutOfRange {
        /// Requested deceleration in RPM per second
        requested: f32,
        /// Maximum allowed deceleration in RPM per second
        max: f32,
    },
}

/// Driver state machine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Movement commanded while the motor is not energized
    NotEnabled,
    /// A previous transport failure latched the driver; reinitialize to recover
    Faulted,
}

/// Transport communication errors.
///
/// The underlying bus error is not carried: transports are generic and their
/// error types are neither `Clone` nor comparable. Local cached state always
/// reflects the last *acknowledged* command when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommError {
    /// Bus write failed or timed out
    Write,
    /// Bus read failed or timed out
    Read,
}

/// Controller response framing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Response CRC did not match after the single allowed retry
    ChecksumMismatch {
        /// CRC computed over the received payload
        expected: u8,
        /// CRC byte received from the controller
        actual: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Range(e) => write!(f, "Out of range: {}", e),
            Error::State(e) => write!(f, "State error: {}", e),
            Error::Comm(e) => write!(f, "Communication error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microsteps: {}. Valid values: 1, 2, 4, 8, 16, 32", v)
            }
            ConfigError::UnsupportedStepMode(v) => {
                write!(f, "Microstep divisor {} not supported by this controller", v)
            }
            ConfigError::InvalidStepsPerRev(v) => {
                write!(f, "Invalid steps per revolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidDistancePerRev(v) => {
                write!(f, "Invalid distance per revolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidSpeedBounds { min, max } => {
                write!(f, "Invalid speed bounds: min {} / max {}. Need 0 < min < max", min, max)
            }
            ConfigError::InvalidAccelCap(v) => {
                write!(f, "Invalid acceleration cap: {}. Must be > 0", v)
            }
            ConfigError::InvalidSoftLimits { min, max } => {
                write!(f, "Invalid soft limits: min ({}) must be < max ({})", min, max)
            }
            ConfigError::MotorNotFound(name) => write!(f, "Motor '{}' not found", name),
            ConfigError::LimitSwitchNotConfigured(dir) => {
                write!(f, "No {} limit switch configured on the controller", dir)
            }
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::PositionOutOfRange { target, min, max } => {
                write!(f, "Target {} steps outside limits [{}, {}]", target, min, max)
            }
            RangeError::SpeedOutOfRange { requested, min, max } => {
                write!(f, "Speed {} RPM outside bounds [{}, {}]", requested, min, max)
            }
            RangeError::AccelOutOfRange { requested, max } => {
                write!(f, "Acceleration {} RPM/s exceeds cap {}", requested, max)
            }
            RangeError::DecelOutOfRange { requested, max } => {
                write!(f, "Deceleration {} RPM/s exceeds cap {}", requested, max)
            }
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NotEnabled => write!(f, "Motor is not enabled"),
            StateError::Faulted => write!(f, "Driver is faulted; reinitialize to recover"),
        }
    }
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommError::Write => write!(f, "Transport write failed"),
            CommError::Read => write!(f, "Transport read failed"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ChecksumMismatch { expected, actual } => {
                write!(f, "Response CRC mismatch: expected {:#04x}, got {:#04x}", expected, actual)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Error::Range(e)
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::State(e)
    }
}

impl From<CommError> for Error {
    fn from(e: CommError) -> Self {
        Error::Comm(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for RangeError {}

#[cfg(feature = "std")]
impl std::error::Error for StateError {}

#[cfg(feature = "std")]
impl std::error::Error for CommError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}
