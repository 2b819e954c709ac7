//! Drive schemes: winding excitation tables for one step cycle.

use core::fmt;
use core::str::FromStr;

use crate::error::{truncated, ConfigError};

/// Activation state of the four windings, in order a1, b1, a2, b2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindingState {
    /// Winding a1.
    pub a1: bool,
    /// Winding b1.
    pub b1: bool,
    /// Winding a2.
    pub a2: bool,
    /// Winding b2.
    pub b2: bool,
}

impl WindingState {
    /// All windings off.
    pub const OFF: Self = Self::new(false, false, false, false);

    /// Create a winding state.
    #[inline]
    pub const fn new(a1: bool, b1: bool, a2: bool, b2: bool) -> Self {
        Self { a1, b1, a2, b2 }
    }

    /// States as an array in a1, b1, a2, b2 order.
    #[inline]
    pub const fn as_array(self) -> [bool; 4] {
        [self.a1, self.b1, self.a2, self.b2]
    }

    /// Number of energised windings.
    pub fn active_count(self) -> usize {
        self.as_array().iter().filter(|&&on| on).count()
    }
}

const fn ws(a1: u8, b1: u8, a2: u8, b2: u8) -> WindingState {
    WindingState::new(a1 != 0, b1 != 0, a2 != 0, b2 != 0)
}

// Wave and full-step hold each state for two entries so every table spans the
// same rotor angle per cycle as half-step.
const WAVE: [WindingState; 8] = [
    ws(1, 0, 0, 0),
    ws(1, 0, 0, 0),
    ws(0, 1, 0, 0),
    ws(0, 1, 0, 0),
    ws(0, 0, 1, 0),
    ws(0, 0, 1, 0),
    ws(0, 0, 0, 1),
    ws(0, 0, 0, 1),
];

const FULL_STEP: [WindingState; 8] = [
    ws(1, 0, 0, 1),
    ws(1, 0, 0, 1),
    ws(1, 1, 0, 0),
    ws(1, 1, 0, 0),
    ws(0, 1, 1, 0),
    ws(0, 1, 1, 0),
    ws(0, 0, 1, 1),
    ws(0, 0, 1, 1),
];

const HALF_STEP: [WindingState; 8] = [
    ws(1, 0, 0, 1),
    ws(1, 0, 0, 0),
    ws(1, 1, 0, 0),
    ws(0, 1, 0, 0),
    ws(0, 1, 1, 0),
    ws(0, 0, 1, 0),
    ws(0, 0, 1, 1),
    ws(0, 0, 0, 1),
];

/// Excitation pattern used to rotate the motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveScheme {
    /// One winding energised at a time.
    Wave,
    /// Two adjacent windings energised, higher torque.
    FullStep,
    /// Alternating one and two windings, doubles angular resolution.
    #[default]
    HalfStep,
}

impl DriveScheme {
    /// Every supported scheme.
    pub const ALL: [DriveScheme; 3] = [
        DriveScheme::Wave,
        DriveScheme::FullStep,
        DriveScheme::HalfStep,
    ];

    /// Canonical configuration name.
    pub const fn name(self) -> &'static str {
        match self {
            DriveScheme::Wave => "wave",
            DriveScheme::FullStep => "full_step",
            DriveScheme::HalfStep => "half_step",
        }
    }

    /// Winding states for one cycle, in forward order.
    pub const fn sequence(self) -> &'static [WindingState] {
        match self {
            DriveScheme::Wave => &WAVE,
            DriveScheme::FullStep => &FULL_STEP,
            DriveScheme::HalfStep => &HALF_STEP,
        }
    }

    /// Look a scheme up by name.
    ///
    /// Matching ignores case and treats `-` and spaces as `_`, so `"Half Step"`
    /// and `"full-step"` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDriveScheme`] for any other name.
    pub fn from_name(name: &str) -> core::result::Result<Self, ConfigError> {
        let normalized = name.trim().chars().map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        });

        DriveScheme::ALL
            .into_iter()
            .find(|scheme| scheme.name().chars().eq(normalized.clone()))
            .ok_or_else(|| ConfigError::UnknownDriveScheme(truncated(name)))
    }
}

impl FromStr for DriveScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        DriveScheme::from_name(s)
    }
}

impl fmt::Display for DriveScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_energises_one_winding() {
        assert!(DriveScheme::Wave
            .sequence()
            .iter()
            .all(|s| s.active_count() == 1));
    }

    #[test]
    fn test_full_step_energises_two_windings() {
        assert!(DriveScheme::FullStep
            .sequence()
            .iter()
            .all(|s| s.active_count() == 2));
    }

    #[test]
    fn test_half_step_alternates() {
        let counts: Vec<_> = DriveScheme::HalfStep
            .sequence()
            .iter()
            .map(|s| s.active_count())
            .collect();
        assert_eq!(counts, [2, 1, 2, 1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_tables_have_equal_length() {
        for scheme in DriveScheme::ALL {
            assert_eq!(scheme.sequence().len(), 8, "{}", scheme);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(DriveScheme::from_name("wave"), Ok(DriveScheme::Wave));
        assert_eq!(DriveScheme::from_name("Full Step"), Ok(DriveScheme::FullStep));
        assert_eq!(DriveScheme::from_name("half-step"), Ok(DriveScheme::HalfStep));
        assert_eq!("HALF_STEP".parse::<DriveScheme>(), Ok(DriveScheme::HalfStep));
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!(matches!(
            DriveScheme::from_name("micro_step"),
            Err(ConfigError::UnknownDriveScheme(name)) if name.as_str() == "micro_step"
        ));
        assert!(DriveScheme::from_name("").is_err());
    }

    #[test]
    fn test_default_is_half_step() {
        assert_eq!(DriveScheme::default(), DriveScheme::HalfStep);
    }
}
