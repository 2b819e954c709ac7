//! Stage configuration - root configuration structure.

use serde::Deserialize;

use crate::error::ConfigError;

use super::endstop::EndStopConfig;
use super::limits::StageLimits;
use super::motor::MotorConfig;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Home position index.
    pub min_limit: i64,

    /// Far end position index.
    pub max_limit: i64,

    /// Give up homing after this many steps. Unbounded when absent.
    #[serde(default)]
    pub max_homing_steps: Option<u64>,

    /// Motor wiring and timing.
    pub motor: MotorConfig,

    /// Home switch wiring.
    pub end_stop: EndStopConfig,
}

impl StageConfig {
    /// Travel limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLimits`] if `min_limit > max_limit`.
    pub fn limits(&self) -> Result<StageLimits, ConfigError> {
        StageLimits::new(self.min_limit, self.max_limit)
    }

    /// Every I/O channel the stage claims: the four windings then the end stop.
    pub fn channels(&self) -> [u8; 5] {
        let [a1, b1, a2, b2] = self.motor.pins.as_array();
        [a1, b1, a2, b2, self.end_stop.pin]
    }
}
