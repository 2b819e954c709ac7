//! Configuration validation.

use crate::error::{ConfigError, Result};

use super::StageConfig;

/// Validate a stage configuration.
///
/// Checks:
/// - The drive scheme name is known
/// - Limits are ordered (min <= max)
/// - No channel is assigned twice
/// - A homing step bound, if given, is non-zero
pub fn validate_config(config: &StageConfig) -> Result<()> {
    config.motor.drive_scheme()?;
    config.limits()?;

    let channels = config.channels();
    for (i, channel) in channels.iter().enumerate() {
        if channels[..i].contains(channel) {
            return Err(ConfigError::DuplicateChannel(*channel).into());
        }
    }

    if config.max_homing_steps == Some(0) {
        return Err(ConfigError::InvalidHomingLimit.into());
    }

    Ok(())
}
