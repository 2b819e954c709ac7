//! Unipolar stepper motor driver.
//!
//! Generic over embedded-hal 1.0 output pins and delay provider.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::debug;

use crate::config::MotorConfig;
use crate::error::Result;
use crate::io::IoContext;

use super::coil::Coils;
use super::drive::DriveScheme;

/// Settle delay used when none is configured.
pub const DEFAULT_SETTLE_MS: u32 = 20;

/// Relative motion primitives the stage controller drives.
///
/// One cycle is a full pass through the drive scheme table, which moves the
/// carriage by one position index.
pub trait StepperDrive {
    /// Rotate forward by `cycles` full drive-scheme cycles.
    fn forward(&mut self, cycles: u64) -> Result<()>;

    /// Rotate backward by `cycles` full drive-scheme cycles.
    fn backward(&mut self, cycles: u64) -> Result<()>;

    /// Switch every winding off.
    fn deactivate(&mut self) -> Result<()>;
}

/// Unipolar stepper motor.
///
/// Generic over:
/// - `P`: winding output pin type (must implement `OutputPin`)
/// - `D`: delay provider (must implement `DelayNs`)
pub struct Motor<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// The four windings.
    coils: Coils<P>,

    /// Excitation table, fixed at construction.
    scheme: DriveScheme,

    /// Delay provider for the settle pause.
    delay: D,

    /// Pause after each sub-step so the rotor can follow.
    settle_ms: u32,
}

impl<P, D> Motor<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Create a motor from its coils.
    pub fn new(coils: Coils<P>, scheme: DriveScheme, delay: D, settle_ms: u32) -> Self {
        debug!(
            "Instantiated motor with drive scheme {}, settle delay {} ms",
            scheme.name(),
            settle_ms
        );
        Self {
            coils,
            scheme,
            delay,
            settle_ms,
        }
    }

    /// Build a motor from configuration, claiming its four winding channels from `io`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown drive scheme, or whatever
    /// `io` reports when a channel cannot be claimed.
    pub fn from_config<IO>(config: &MotorConfig, io: &mut IO, delay: D) -> Result<Self>
    where
        IO: IoContext<Output = P>,
    {
        let scheme = config.drive_scheme()?;
        let pins = &config.pins;
        let coils = Coils::new(
            io.output(pins.a1)?,
            io.output(pins.b1)?,
            io.output(pins.a2)?,
            io.output(pins.b2)?,
        )?;
        Ok(Self::new(coils, scheme, delay, config.settle_ms))
    }

    /// Drive scheme in use.
    #[inline]
    pub fn drive_scheme(&self) -> DriveScheme {
        self.scheme
    }

    /// Settle delay between sub-steps in milliseconds.
    #[inline]
    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    /// The motor's windings.
    #[inline]
    pub fn coils(&self) -> &Coils<P> {
        &self.coils
    }

    /// Take the motor apart.
    pub fn release(self) -> (Coils<P>, D) {
        (self.coils, self.delay)
    }

    fn rotate(&mut self, cycles: u64, reverse: bool) -> Result<()> {
        let sequence = self.scheme.sequence();
        for _ in 0..cycles {
            if reverse {
                for &state in sequence.iter().rev() {
                    self.coils.set_state(state)?;
                    self.delay.delay_ms(self.settle_ms);
                }
            } else {
                for &state in sequence {
                    self.coils.set_state(state)?;
                    self.delay.delay_ms(self.settle_ms);
                }
            }
        }
        Ok(())
    }
}

impl<P, D> StepperDrive for Motor<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn forward(&mut self, cycles: u64) -> Result<()> {
        debug!("Moving forward {} steps", cycles);
        self.rotate(cycles, false)
    }

    fn backward(&mut self, cycles: u64) -> Result<()> {
        debug!("Moving backward {} steps", cycles);
        self.rotate(cycles, true)
    }

    fn deactivate(&mut self) -> Result<()> {
        debug!("Deactivating coils");
        self.coils.deactivate()
    }
}
