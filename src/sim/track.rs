//! Simulated carriage on a bounded track.

use embedded_hal::digital::InputPin;
use log::trace;

use crate::config::StageLimits;
use crate::endstop::{EndStopHandle, Polarity};
use crate::error::{ConfigError, Result};
use crate::motor::StepperDrive;

use super::board::SimLine;

/// Wraps a drive and moves a virtual carriage one position per cycle.
///
/// The home switch sits at carriage position 0 and closes whenever the carriage
/// is there. The carriage stalls at both ends of the track: backward cycles at 0
/// and forward cycles at `travel` are issued to the drive but do not move it.
pub struct SimulatedTrack<M: StepperDrive> {
    drive: M,
    switch: SimLine,
    polarity: Polarity,
    travel: i64,
    carriage: i64,
    forward_cycles: u64,
    backward_cycles: u64,
    deactivations: u64,
    interrupt: Option<Box<dyn Fn()>>,
}

impl<M: StepperDrive> SimulatedTrack<M> {
    /// Put the carriage at home on a track `travel` positions long.
    ///
    /// `switch` is the end stop's input line, driven according to `polarity`.
    pub fn new(drive: M, switch: SimLine, polarity: Polarity, travel: i64) -> Self {
        let mut track = Self {
            drive,
            switch,
            polarity,
            travel: travel.max(0),
            carriage: 0,
            forward_cycles: 0,
            backward_cycles: 0,
            deactivations: 0,
            interrupt: None,
        };
        track.update_switch();
        track
    }

    /// Put the carriage at home on a track exactly as long as `limits` span.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SpanTooLarge`] if the span exceeds `i64::MAX`.
    pub fn spanning(
        drive: M,
        switch: SimLine,
        polarity: Polarity,
        limits: StageLimits,
    ) -> Result<Self> {
        let span = limits.span();
        let travel = i64::try_from(span).map_err(|_| ConfigError::SpanTooLarge(span))?;
        Ok(Self::new(drive, switch, polarity, travel))
    }

    /// Place the carriage at `position`, clamped to the track.
    pub fn with_carriage(mut self, position: i64) -> Self {
        self.carriage = position.clamp(0, self.travel);
        self.update_switch();
        self
    }

    /// Raise an activation on `handle` whenever the switch closes, like an edge interrupt.
    pub fn set_interrupt<IN>(&mut self, handle: EndStopHandle<IN>)
    where
        IN: InputPin + 'static,
    {
        self.interrupt = Some(Box::new(move || handle.notify()));
    }

    /// Physical carriage position, 0 at the home switch.
    pub fn carriage(&self) -> i64 {
        self.carriage
    }

    /// Track length.
    pub fn travel(&self) -> i64 {
        self.travel
    }

    /// Forward cycles issued so far.
    pub fn forward_cycles(&self) -> u64 {
        self.forward_cycles
    }

    /// Backward cycles issued so far.
    pub fn backward_cycles(&self) -> u64 {
        self.backward_cycles
    }

    /// Number of deactivate calls.
    pub fn deactivations(&self) -> u64 {
        self.deactivations
    }

    /// The wrapped drive.
    pub fn drive(&self) -> &M {
        &self.drive
    }

    /// Unwrap the drive.
    pub fn into_inner(self) -> M {
        self.drive
    }

    fn update_switch(&mut self) {
        let was_closed = self.polarity.logical(self.switch.is_high());
        let closed = self.carriage == 0;
        // logical() maps both ways: triggered -> electrical level too.
        self.switch.set_level(self.polarity.logical(closed));

        if closed && !was_closed {
            trace!("Carriage reached home switch");
            if let Some(notify) = &self.interrupt {
                notify();
            }
        }
    }
}

impl<M: StepperDrive> StepperDrive for SimulatedTrack<M> {
    fn forward(&mut self, cycles: u64) -> Result<()> {
        for _ in 0..cycles {
            self.drive.forward(1)?;
            self.forward_cycles += 1;
            if self.carriage < self.travel {
                self.carriage += 1;
            }
            self.update_switch();
        }
        Ok(())
    }

    fn backward(&mut self, cycles: u64) -> Result<()> {
        for _ in 0..cycles {
            self.drive.backward(1)?;
            self.backward_cycles += 1;
            if self.carriage > 0 {
                self.carriage -= 1;
            }
            self.update_switch();
        }
        Ok(())
    }

    fn deactivate(&mut self) -> Result<()> {
        self.deactivations += 1;
        self.drive.deactivate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Drive that only counts calls.
    #[derive(Default)]
    struct NullDrive {
        calls: u64,
    }

    impl StepperDrive for NullDrive {
        fn forward(&mut self, cycles: u64) -> Result<()> {
            self.calls += cycles;
            Ok(())
        }

        fn backward(&mut self, cycles: u64) -> Result<()> {
            self.calls += cycles;
            Ok(())
        }

        fn deactivate(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_switch_follows_carriage() {
        let line = SimLine::new(true);
        let mut track =
            SimulatedTrack::new(NullDrive::default(), line.clone(), Polarity::ActiveLow, 10);
        assert!(!line.is_high());

        track.forward(3).unwrap();
        assert_eq!(track.carriage(), 3);
        assert!(line.is_high());

        track.backward(3).unwrap();
        assert!(!line.is_high());
    }

    #[test]
    fn test_carriage_stalls_at_ends() {
        let line = SimLine::new(false);
        let mut track =
            SimulatedTrack::new(NullDrive::default(), line.clone(), Polarity::ActiveHigh, 5)
                .with_carriage(2);
        assert!(!line.is_high());

        track.forward(10).unwrap();
        assert_eq!(track.carriage(), 5);

        track.backward(20).unwrap();
        assert_eq!(track.carriage(), 0);
        assert!(line.is_high());

        assert_eq!(track.forward_cycles(), 10);
        assert_eq!(track.backward_cycles(), 20);
        assert_eq!(track.drive().calls, 30);
    }

    #[test]
    fn test_start_position_clamped() {
        let track = SimulatedTrack::new(
            NullDrive::default(),
            SimLine::default(),
            Polarity::ActiveHigh,
            4,
        )
        .with_carriage(9);
        assert_eq!(track.carriage(), 4);
        assert_eq!(track.travel(), 4);
    }

    #[test]
    fn test_spanning_matches_limits() {
        let limits = StageLimits::new(-20, 30).unwrap();
        let line = SimLine::default();
        let track =
            SimulatedTrack::spanning(NullDrive::default(), line, Polarity::ActiveHigh, limits)
                .unwrap();
        assert_eq!(track.travel(), 50);
        assert_eq!(track.carriage(), 0);
    }

    #[test]
    fn test_spanning_rejects_oversized_limits() {
        let limits = StageLimits::new(i64::MIN, i64::MAX).unwrap();
        let line = SimLine::default();
        let result =
            SimulatedTrack::spanning(NullDrive::default(), line, Polarity::ActiveLow, limits);

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::SpanTooLarge(span))) if span == u64::MAX
        ));
    }
}
