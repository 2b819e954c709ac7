//! Hardware simulation.
//!
//! A GPIO board, a sleeping delay provider and a carriage on a bounded track, so the
//! stage can be exercised on a development machine without any hardware attached.

mod board;
mod track;

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

pub use board::{SimBoard, SimInput, SimLine, SimOutput};
pub use track::SimulatedTrack;

/// Delay provider that sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        if ns > 0 {
            thread::sleep(Duration::from_nanos(u64::from(ns)));
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}
