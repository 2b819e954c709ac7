//! Motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::motor::{DriveScheme, DEFAULT_SETTLE_MS};

/// Output channels of the four windings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CoilPins {
    /// Winding a1 channel.
    pub a1: u8,
    /// Winding b1 channel.
    pub b1: u8,
    /// Winding a2 channel.
    pub a2: u8,
    /// Winding b2 channel.
    pub b2: u8,
}

impl CoilPins {
    /// Channels in a1, b1, a2, b2 order.
    #[inline]
    pub const fn as_array(&self) -> [u8; 4] {
        [self.a1, self.b1, self.a2, self.b2]
    }
}

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Winding channel assignment.
    pub pins: CoilPins,

    /// Drive scheme name (`wave`, `full_step` or `half_step`).
    #[serde(default = "default_drive_scheme")]
    pub drive_scheme: String<32>,

    /// Pause after each sub-step in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u32,
}

fn default_drive_scheme() -> String<32> {
    let mut name = String::new();
    // The longest scheme name fits comfortably in 32 bytes.
    let _ = name.push_str(DriveScheme::default().name());
    name
}

fn default_settle_ms() -> u32 {
    DEFAULT_SETTLE_MS
}

impl MotorConfig {
    /// Create a configuration for the given channels and scheme.
    pub fn new(pins: CoilPins, drive_scheme: DriveScheme, settle_ms: u32) -> Self {
        let mut name = String::new();
        let _ = name.push_str(drive_scheme.name());
        Self {
            pins,
            drive_scheme: name,
            settle_ms,
        }
    }

    /// Resolve the configured drive scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDriveScheme`] for an unrecognised name.
    pub fn drive_scheme(&self) -> Result<DriveScheme, ConfigError> {
        DriveScheme::from_name(&self.drive_scheme)
    }
}
