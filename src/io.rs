//! I/O context handle.
//!
//! Motor and end stop construction from configuration goes through an explicit
//! [`IoContext`] that turns channel numbers into embedded-hal pins, instead of a
//! process-wide GPIO setup.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::Result;

/// Input bias resistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// Pull the line high; an active-low switch grounds it.
    Up,
    /// Pull the line low; an active-high switch drives it high.
    Down,
}

/// An initialised digital I/O provider.
pub trait IoContext {
    /// Output pin type handed to coils.
    type Output: OutputPin;
    /// Input pin type handed to end stops.
    type Input: InputPin;

    /// Claim `channel` as a digital output.
    fn output(&mut self, channel: u8) -> Result<Self::Output>;

    /// Claim `channel` as a digital input with the given bias.
    fn input(&mut self, channel: u8, pull: Pull) -> Result<Self::Input>;
}
