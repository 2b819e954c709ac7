//! Stage controller states.

use core::fmt;

/// Where the stage controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageState {
    /// Position undefined; the stage has not homed yet, or homing failed.
    #[default]
    Uninitialized,
    /// Driving towards the end stop.
    Homing,
    /// At rest at a known position.
    Idle(i64),
    /// Travelling to a target position.
    Moving(i64),
}

impl StageState {
    /// State name for display/debugging.
    pub const fn name(&self) -> &'static str {
        match self {
            StageState::Uninitialized => "Uninitialized",
            StageState::Homing => "Homing",
            StageState::Idle(_) => "Idle",
            StageState::Moving(_) => "Moving",
        }
    }

    /// Whether the position is known in this state.
    #[inline]
    pub const fn is_homed(&self) -> bool {
        matches!(self, StageState::Idle(_) | StageState::Moving(_))
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageState::Idle(position) => write!(f, "Idle({})", position),
            StageState::Moving(target) => write!(f, "Moving({})", target),
            other => f.write_str(other.name()),
        }
    }
}
