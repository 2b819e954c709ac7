//! Stage travel limits.

use crate::error::{ConfigError, StageError};

/// Inclusive position bounds of the stage, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLimits {
    min: i64,
    max: i64,
}

impl StageLimits {
    /// Create limits.
    ///
    /// `min == max` is allowed and describes a stage that can only sit at home.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLimits`] if `min > max`.
    pub fn new(min: i64, max: i64) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidLimits { min, max });
        }
        Ok(Self { min, max })
    }

    /// Minimum position (the home position).
    #[inline]
    pub const fn min(&self) -> i64 {
        self.min
    }

    /// Maximum position.
    #[inline]
    pub const fn max(&self) -> i64 {
        self.max
    }

    /// Number of positions between the limits.
    #[inline]
    pub const fn span(&self) -> u64 {
        self.max.abs_diff(self.min)
    }

    /// Check if a position is within limits.
    #[inline]
    pub fn contains(&self, position: i64) -> bool {
        position >= self.min && position <= self.max
    }

    /// Pass `target` through if it is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::OutOfRange`] otherwise.
    pub fn check(&self, target: i64) -> Result<i64, StageError> {
        if self.contains(target) {
            Ok(target)
        } else {
            Err(StageError::OutOfRange {
                target,
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_inclusive() {
        let limits = StageLimits::new(0, 100).unwrap();

        assert!(limits.contains(0));
        assert!(limits.contains(100));
        assert!(!limits.contains(-1));
        assert!(!limits.contains(101));
        assert_eq!(limits.span(), 100);
    }

    #[test]
    fn test_check_reports_bounds() {
        let limits = StageLimits::new(-5, 5).unwrap();

        assert_eq!(limits.check(3), Ok(3));
        assert_eq!(
            limits.check(6),
            Err(StageError::OutOfRange {
                target: 6,
                min: -5,
                max: 5
            })
        );
    }

    #[test]
    fn test_degenerate_limits_allowed() {
        let limits = StageLimits::new(7, 7).unwrap();
        assert!(limits.contains(7));
        assert_eq!(limits.span(), 0);
    }

    #[test]
    fn test_inverted_limits_rejected() {
        assert_eq!(
            StageLimits::new(10, -10),
            Err(ConfigError::InvalidLimits {
                min: 10,
                max: -10
            })
        );
    }
}
