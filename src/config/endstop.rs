//! End stop configuration from TOML.

use serde::Deserialize;

use crate::endstop::Polarity;

/// Input channel and electrical behaviour of the home switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EndStopConfig {
    /// Input channel.
    pub pin: u8,

    /// The line reads low when the switch is triggered (normally-high wiring).
    #[serde(default)]
    pub active_low: bool,

    /// Edges closer together than this are treated as contact bounce.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

fn default_debounce_ms() -> u32 {
    200
}

impl EndStopConfig {
    /// Polarity implied by `active_low`.
    #[inline]
    pub fn polarity(&self) -> Polarity {
        if self.active_low {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }
}
