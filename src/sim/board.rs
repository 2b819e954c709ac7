//! In-memory GPIO board.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::trace;

use crate::error::{ConfigError, Result};
use crate::io::{IoContext, Pull};

/// Electrical level of one simulated line, shared between its pin and test code.
#[derive(Debug, Clone, Default)]
pub struct SimLine(Arc<AtomicBool>);

impl SimLine {
    /// A new line at `high`.
    pub fn new(high: bool) -> Self {
        Self(Arc::new(AtomicBool::new(high)))
    }

    /// Drive the line to `high`.
    pub fn set_level(&self, high: bool) {
        self.0.store(high, Ordering::SeqCst);
    }

    /// Drive the line high.
    pub fn set_high(&self) {
        self.set_level(true);
    }

    /// Drive the line low.
    pub fn set_low(&self) {
        self.set_level(false);
    }

    /// Current level.
    pub fn is_high(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Output pin on a [`SimBoard`].
#[derive(Debug)]
pub struct SimOutput {
    channel: u8,
    line: SimLine,
}

impl SimOutput {
    /// Whether the pin is currently driven high.
    pub fn is_set_high(&self) -> bool {
        self.line.is_high()
    }
}

impl ErrorType for SimOutput {
    type Error = Infallible;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        trace!("Channel {} low", self.channel);
        self.line.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        trace!("Channel {} high", self.channel);
        self.line.set_high();
        Ok(())
    }
}

/// Input pin on a [`SimBoard`].
#[derive(Debug)]
pub struct SimInput {
    line: SimLine,
}

impl ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.line.is_high())
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(!self.line.is_high())
    }
}

/// A GPIO board with no hardware behind it.
///
/// Every channel can be claimed once. Lines stay reachable through
/// [`SimBoard::line`] so a simulation can drive inputs and observe outputs.
#[derive(Debug, Default)]
pub struct SimBoard {
    lines: HashMap<u8, SimLine>,
}

impl SimBoard {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// The line behind a claimed channel.
    pub fn line(&self, channel: u8) -> Option<SimLine> {
        self.lines.get(&channel).cloned()
    }

    /// The line behind a channel that must already be claimed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnclaimedChannel`] if nothing claimed `channel`.
    pub fn claimed_line(&self, channel: u8) -> Result<SimLine> {
        self.line(channel)
            .ok_or_else(|| ConfigError::UnclaimedChannel(channel).into())
    }

    /// Number of claimed channels.
    pub fn claimed(&self) -> usize {
        self.lines.len()
    }

    fn claim(&mut self, channel: u8, high: bool) -> Result<SimLine> {
        if self.lines.contains_key(&channel) {
            return Err(ConfigError::DuplicateChannel(channel).into());
        }
        let line = SimLine::new(high);
        self.lines.insert(channel, line.clone());
        Ok(line)
    }
}

impl IoContext for SimBoard {
    type Output = SimOutput;
    type Input = SimInput;

    fn output(&mut self, channel: u8) -> Result<SimOutput> {
        let line = self.claim(channel, false)?;
        Ok(SimOutput { channel, line })
    }

    fn input(&mut self, channel: u8, pull: Pull) -> Result<SimInput> {
        let line = self.claim(channel, pull == Pull::Up)?;
        Ok(SimInput { line })
    }
}
