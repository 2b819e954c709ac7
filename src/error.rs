//! Error types for linear-stage.
//!
//! Provides unified error handling across configuration, motor control, the end stop
//! and the stage controller.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all linear-stage operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motor operation error
    Motor(MotorError),
    /// End stop input or callback error
    EndStop(EndStopError),
    /// Stage position or homing error
    Stage(StageError),
}

/// Configuration-related errors.
///
/// These are fatal at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Drive scheme name not recognised
    UnknownDriveScheme(heapless::String<32>),
    /// Invalid stage limits (min must be <= max)
    InvalidLimits {
        /// Minimum limit value
        min: i64,
        /// Maximum limit value
        max: i64,
    },
    /// The same I/O channel is assigned twice
    DuplicateChannel(u8),
    /// Homing step bound must be greater than zero
    InvalidHomingLimit,
    /// Channel looked up before anything claimed it
    UnclaimedChannel(u8),
    /// Travel span too long to lay out as a track
    SpanTooLarge(u64),
    /// File I/O error
    IoError(heapless::String<128>),
}

/// Motor operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
}

/// End stop errors.
#[derive(Debug, Clone, PartialEq)]
pub enum EndStopError {
    /// Reading the input pin failed
    PinError,
    /// Deregistering a callback that was never registered
    NotRegistered,
    /// No room left in the callback table
    CallbackTableFull,
}

/// Stage controller errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    /// Requested position lies outside the stage limits
    OutOfRange {
        /// Requested position
        target: i64,
        /// Minimum position
        min: i64,
        /// Maximum position
        max: i64,
    },
    /// Position read or move requested before homing completed
    PositionUndefined,
    /// Homing gave up after the configured number of steps
    HomingFailed {
        /// Steps issued before giving up
        steps: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::EndStop(e) => write!(f, "End stop error: {}", e),
            Error::Stage(e) => write!(f, "Stage error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::UnknownDriveScheme(name) => write!(
                f,
                "Drive scheme '{}' unrecognised. Valid schemes: wave, full_step, half_step",
                name
            ),
            ConfigError::InvalidLimits { min, max } => {
                write!(f, "Invalid limits: min ({}) must be <= max ({})", min, max)
            }
            ConfigError::DuplicateChannel(ch) => {
                write!(f, "Channel {} is assigned more than once", ch)
            }
            ConfigError::InvalidHomingLimit => write!(f, "max_homing_steps must be > 0"),
            ConfigError::UnclaimedChannel(ch) => write!(f, "Channel {} has not been claimed", ch),
            ConfigError::SpanTooLarge(span) => {
                write!(f, "Travel span {} does not fit a track length", span)
            }
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

impl fmt::Display for EndStopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndStopError::PinError => write!(f, "GPIO input read failed"),
            EndStopError::NotRegistered => write!(f, "Cannot deregister callback: not registered"),
            EndStopError::CallbackTableFull => write!(f, "Callback table is full"),
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::OutOfRange { target, min, max } => {
                write!(f, "Cannot go to position {}: outside [{}, {}]", target, min, max)
            }
            StageError::PositionUndefined => {
                write!(f, "Position is undefined. Go to home position")
            }
            StageError::HomingFailed { steps } => {
                write!(f, "End stop not reached after {} homing steps", steps)
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

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<EndStopError> for Error {
    fn from(e: EndStopError) -> Self {
        Error::EndStop(e)
    }
}

impl From<StageError> for Error {
    fn from(e: StageError) -> Self {
        Error::Stage(e)
    }
}

impl std::error::Error for Error {}

impl std::error::Error for ConfigError {}

impl std::error::Error for MotorError {}

impl std::error::Error for EndStopError {}

impl std::error::Error for StageError {}

/// Copy a message into a fixed-capacity string, truncating on a char boundary.
pub(crate) fn truncated<const N: usize>(msg: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in msg.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
