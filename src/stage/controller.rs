//! Stage position controller.
//!
//! Owns the drive and the end stop, establishes the zero reference by homing
//! against the end stop, and turns absolute position requests into relative
//! motor cycles.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::config::{validate_config, StageConfig, StageLimits};
use crate::endstop::{Callback, EndStop, HomeSignal};
use crate::error::{Result, StageError};
use crate::io::IoContext;
use crate::motor::{Motor, StepperDrive};

use super::state::StageState;

/// Linear stage controller.
///
/// Generic over:
/// - `M`: the drive moving the carriage (usually [`Motor`])
/// - `IN`: the end stop input pin type
///
/// The end stop is wired at the `min` end of travel. Position is undefined until
/// [`Stage::home`] succeeds.
pub struct Stage<M, IN>
where
    M: StepperDrive,
    IN: InputPin,
{
    /// Drive moving the carriage.
    drive: M,

    /// Home limit switch.
    end_stop: EndStop<IN>,

    /// Travel bounds.
    limits: StageLimits,

    /// Current position, `None` until homed.
    position: Option<i64>,

    /// Controller state.
    state: StageState,

    /// Set by the end-stop callback when the switch closes.
    homed: Arc<HomeSignal>,

    /// Our registration in the end stop's callback table.
    callback: Callback,

    /// Optional bound on homing steps.
    max_homing_steps: Option<u64>,
}

impl<M, IN> Stage<M, IN>
where
    M: StepperDrive,
    IN: InputPin,
{
    /// Create a stage and home it.
    ///
    /// # Errors
    ///
    /// Returns an error if the end stop's callback table is full or homing fails.
    pub fn new(drive: M, end_stop: EndStop<IN>, limits: StageLimits) -> Result<Self> {
        let mut stage = Self::attach(drive, end_stop, limits)?;
        stage.home()?;
        Ok(stage)
    }

    /// Create a stage without homing it. Position stays undefined until [`Stage::home`].
    ///
    /// # Errors
    ///
    /// Returns an error if the end stop's callback table is full.
    pub fn attach(drive: M, end_stop: EndStop<IN>, limits: StageLimits) -> Result<Self> {
        info!("Instantiating stage with limits [{}, {}]", limits.min(), limits.max());

        let homed = Arc::new(HomeSignal::new());
        let signal = Arc::clone(&homed);
        let callback: Callback = Arc::new(move || signal.set());
        end_stop.register_callback(Arc::clone(&callback))?;

        Ok(Self {
            drive,
            end_stop,
            limits,
            position: None,
            state: StageState::Uninitialized,
            homed,
            callback,
            max_homing_steps: None,
        })
    }

    /// Give up homing after `steps` backward steps instead of retrying forever.
    pub fn with_homing_limit(mut self, steps: u64) -> Self {
        self.max_homing_steps = Some(steps);
        self
    }

    /// Send the stage to its home position and reset the position to `min`.
    ///
    /// If the end stop is already triggered no motion occurs. Otherwise the drive
    /// steps backward one cycle at a time until the end stop reports the carriage
    /// home. Without a homing limit this retries indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::HomingFailed`] when a homing limit is set and exceeded,
    /// or any drive / end stop error. Position is undefined afterwards.
    pub fn home(&mut self) -> Result<()> {
        info!("Homing stage...");
        self.state = StageState::Homing;
        self.position = None;
        self.homed.clear();

        if let Err(e) = self.seek_home() {
            self.state = StageState::Uninitialized;
            return Err(e);
        }

        let min = self.limits.min();
        self.position = Some(min);
        self.state = StageState::Idle(min);
        info!("Done");
        Ok(())
    }

    fn seek_home(&mut self) -> Result<()> {
        if self.end_stop.triggered()? {
            debug!("End stop already triggered");
        } else {
            let mut steps: u64 = 0;
            loop {
                if self.max_homing_steps.is_some_and(|limit| steps >= limit) {
                    warn!("End stop not reached after {} steps, giving up", steps);
                    self.drive.deactivate()?;
                    return Err(StageError::HomingFailed { steps }.into());
                }

                self.drive.backward(1)?;
                steps += 1;

                let at_home = self.end_stop.triggered()?;
                if at_home || self.homed.is_set() {
                    break;
                }
            }
            debug!("End stop reached after {} steps", steps);
        }

        self.drive.deactivate()?;
        self.homed.clear();
        Ok(())
    }

    /// Move the stage to its end position.
    ///
    /// # Errors
    ///
    /// See [`Stage::move_to`].
    pub fn end(&mut self) -> Result<()> {
        info!("Stage moving to end...");
        self.move_to(self.limits.max())
    }

    /// Move the stage to `target`.
    ///
    /// Validation happens before any motion. Once motion starts it runs to
    /// completion; a drive error part way leaves the position undefined.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::OutOfRange`] if `target` is outside the limits,
    /// [`StageError::PositionUndefined`] if the stage has not been homed, or any
    /// drive error.
    pub fn move_to(&mut self, target: i64) -> Result<()> {
        let target = self.limits.check(target)?;
        let position = self.position.ok_or(StageError::PositionUndefined)?;

        info!("Moving to position {}...", target);
        self.state = StageState::Moving(target);

        if let Err(e) = self.drive_to(position, target) {
            self.position = None;
            self.state = StageState::Uninitialized;
            return Err(e);
        }

        self.position = Some(target);
        self.homed.clear();
        self.state = StageState::Idle(target);
        info!("Done");
        Ok(())
    }

    fn drive_to(&mut self, position: i64, target: i64) -> Result<()> {
        let cycles = target.abs_diff(position);
        if target > position {
            self.drive.forward(cycles)?;
        } else {
            self.drive.backward(cycles)?;
        }
        self.drive.deactivate()
    }

    /// Current position.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::PositionUndefined`] if the stage has not been homed.
    pub fn position(&self) -> Result<i64> {
        debug!("Reading position...");
        Ok(self.position.ok_or(StageError::PositionUndefined)?)
    }

    /// Whether the position is known.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.position.is_some()
    }

    /// Minimum position index.
    #[inline]
    pub fn min(&self) -> i64 {
        self.limits.min()
    }

    /// Maximum position index.
    #[inline]
    pub fn max(&self) -> i64 {
        self.limits.max()
    }

    /// Travel limits.
    #[inline]
    pub fn limits(&self) -> StageLimits {
        self.limits
    }

    /// Current controller state.
    #[inline]
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Homing step bound, if any.
    #[inline]
    pub fn homing_limit(&self) -> Option<u64> {
        self.max_homing_steps
    }

    /// The drive.
    #[inline]
    pub fn drive(&self) -> &M {
        &self.drive
    }

    /// The end stop.
    #[inline]
    pub fn end_stop(&self) -> &EndStop<IN> {
        &self.end_stop
    }

    /// Detach from the end stop and hand back drive and end stop.
    pub fn release(self) -> (M, EndStop<IN>) {
        if self.end_stop.deregister_callback(&self.callback).is_err() {
            warn!("Stage callback was already deregistered");
        }
        (self.drive, self.end_stop)
    }
}

impl<O, D, IN> Stage<Motor<O, D>, IN>
where
    O: embedded_hal::digital::OutputPin,
    D: DelayNs,
    IN: InputPin,
{
    /// Build motor and end stop from configuration, then create and home the stage.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid configuration, any error `io`
    /// reports while claiming channels, or a homing error.
    pub fn from_config<IO>(config: &StageConfig, io: &mut IO, delay: D) -> Result<Self>
    where
        IO: IoContext<Output = O, Input = IN>,
    {
        validate_config(config)?;

        let motor = Motor::from_config(&config.motor, io, delay)?;
        let end_stop = EndStop::from_config(&config.end_stop, io)?;

        let mut stage = Self::attach(motor, end_stop, config.limits()?)?;
        stage.max_homing_steps = config.max_homing_steps;
        stage.home()?;
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endstop::{EndStopHandle, Polarity};
    use crate::error::{EndStopError, Error};
    use crate::motor::{Coils, DriveScheme, WindingState};
    use crate::sim::{SimBoard, SimInput, SimOutput, SimulatedTrack, StdDelay};

    type TestMotor = Motor<SimOutput, StdDelay>;
    type TestStage = Stage<SimulatedTrack<TestMotor>, SimInput>;

    /// Stage on a track of `travel` positions with the carriage starting at `start`.
    fn rig(min: i64, max: i64, start: i64, polarity: Polarity) -> (TestStage, SimBoard) {
        let mut board = SimBoard::new();
        let coils = Coils::new(
            board.output(1).unwrap(),
            board.output(2).unwrap(),
            board.output(3).unwrap(),
            board.output(4).unwrap(),
        )
        .unwrap();
        let motor = Motor::new(coils, DriveScheme::HalfStep, StdDelay, 0);

        let input = board.input(5, polarity.pull()).unwrap();
        let end_stop = EndStop::new(input, polarity);
        let line = board.claimed_line(5).unwrap();
        let limits = StageLimits::new(min, max).unwrap();
        let track = SimulatedTrack::spanning(motor, line, polarity, limits)
            .unwrap()
            .with_carriage(start);

        let stage = Stage::new(track, end_stop, limits).unwrap();
        (stage, board)
    }

    #[test]
    fn test_home_resets_position() {
        let (stage, _board) = rig(0, 100, 23, Polarity::ActiveLow);

        assert_eq!(stage.position(), Ok(0));
        assert_eq!(stage.state(), StageState::Idle(0));
        assert_eq!(stage.drive().backward_cycles(), 23);
        assert!(stage.end_stop().triggered().unwrap());
    }

    #[test]
    fn test_home_when_already_triggered_does_not_move() {
        let (stage, _board) = rig(-10, 10, 0, Polarity::ActiveHigh);

        assert_eq!(stage.position(), Ok(-10));
        assert_eq!(stage.drive().backward_cycles(), 0);
        assert_eq!(stage.drive().deactivations(), 1);
    }

    #[test]
    fn test_concrete_scenario() {
        let (mut stage, _board) = rig(0, 100, 0, Polarity::ActiveLow);

        stage.move_to(40).unwrap();
        assert_eq!(stage.position(), Ok(40));
        assert_eq!(stage.drive().forward_cycles(), 40);

        stage.move_to(10).unwrap();
        assert_eq!(stage.position(), Ok(10));
        assert_eq!(stage.drive().backward_cycles(), 30);

        stage.end().unwrap();
        assert_eq!(stage.position(), Ok(100));
        assert_eq!(stage.drive().carriage(), 100);
    }

    #[test]
    fn test_out_of_range_rejected_without_motion() {
        let (mut stage, _board) = rig(0, 100, 0, Polarity::ActiveLow);
        stage.move_to(50).unwrap();
        let cycles = stage.drive().forward_cycles() + stage.drive().backward_cycles();

        for target in [101, -1] {
            assert_eq!(
                stage.move_to(target),
                Err(Error::Stage(StageError::OutOfRange {
                    target,
                    min: 0,
                    max: 100
                }))
            );
        }

        assert_eq!(stage.position(), Ok(50));
        assert_eq!(
            stage.drive().forward_cycles() + stage.drive().backward_cycles(),
            cycles
        );
    }

    #[test]
    fn test_moving_off_home_releases_end_stop() {
        let (mut stage, _board) = rig(0, 100, 0, Polarity::ActiveLow);
        assert!(stage.end_stop().triggered().unwrap());

        stage.end().unwrap();
        assert!(!stage.end_stop().triggered().unwrap());

        stage.home().unwrap();
        assert_eq!(stage.position(), Ok(0));
        assert!(stage.end_stop().triggered().unwrap());
        assert_eq!(stage.drive().backward_cycles(), 100);
    }

    #[test]
    fn test_zero_delta_move() {
        let (mut stage, _board) = rig(0, 100, 0, Polarity::ActiveLow);
        stage.move_to(0).unwrap();

        assert_eq!(stage.position(), Ok(0));
        assert_eq!(stage.drive().forward_cycles(), 0);
        assert_eq!(stage.drive().backward_cycles(), 0);
    }

    #[test]
    fn test_position_undefined_before_homing() {
        let mut board = SimBoard::new();
        let coils = Coils::new(
            board.output(1).unwrap(),
            board.output(2).unwrap(),
            board.output(3).unwrap(),
            board.output(4).unwrap(),
        )
        .unwrap();
        let motor = Motor::new(coils, DriveScheme::Wave, StdDelay, 0);
        let input = board.input(5, Polarity::ActiveHigh.pull()).unwrap();
        let end_stop = EndStop::new(input, Polarity::ActiveHigh);

        let mut stage = Stage::attach(motor, end_stop, StageLimits::new(0, 10).unwrap()).unwrap();

        assert_eq!(stage.state(), StageState::Uninitialized);
        assert_eq!(stage.position(), Err(Error::Stage(StageError::PositionUndefined)));
        assert_eq!(stage.move_to(5), Err(Error::Stage(StageError::PositionUndefined)));
        assert_eq!(
            stage.move_to(11),
            Err(Error::Stage(StageError::OutOfRange {
                target: 11,
                min: 0,
                max: 10
            }))
        );
    }

    #[test]
    fn test_homing_limit_gives_up() {
        let mut board = SimBoard::new();
        let coils = Coils::new(
            board.output(1).unwrap(),
            board.output(2).unwrap(),
            board.output(3).unwrap(),
            board.output(4).unwrap(),
        )
        .unwrap();
        let motor = Motor::new(coils, DriveScheme::FullStep, StdDelay, 0);
        // Nothing ever drives this line, so the switch never closes.
        let input = board.input(5, Polarity::ActiveHigh.pull()).unwrap();
        let end_stop = EndStop::new(input, Polarity::ActiveHigh);

        let mut stage = Stage::attach(motor, end_stop, StageLimits::new(0, 10).unwrap())
            .unwrap()
            .with_homing_limit(25);

        assert_eq!(
            stage.home(),
            Err(Error::Stage(StageError::HomingFailed { steps: 25 }))
        );
        assert_eq!(stage.state(), StageState::Uninitialized);
        assert!(!stage.is_homed());
        assert_eq!(stage.drive().coils().state(), WindingState::OFF);
    }

    #[test]
    fn test_interrupt_notification_stops_homing() {
        let (stage, _board) = rig(0, 50, 0, Polarity::ActiveLow);
        let (mut track, end_stop) = stage.release();
        track.set_interrupt(end_stop.handle());
        track.forward(30).unwrap();

        let mut stage = Stage::new(track, end_stop, StageLimits::new(0, 50).unwrap()).unwrap();
        assert_eq!(stage.position(), Ok(0));
        assert_eq!(stage.drive().carriage(), 0);

        stage.move_to(20).unwrap();
        stage.home().unwrap();
        assert_eq!(stage.drive().carriage(), 0);
    }

    /// Drive that reports a switch closure on one backward step while the input
    /// line itself never changes, as when the closure falls between two samples.
    struct MissedEdgeDrive {
        end_stop: EndStopHandle<SimInput>,
        notify_at: u64,
        backward_steps: u64,
    }

    impl StepperDrive for MissedEdgeDrive {
        fn forward(&mut self, _cycles: u64) -> Result<()> {
            Ok(())
        }

        fn backward(&mut self, cycles: u64) -> Result<()> {
            for _ in 0..cycles {
                self.backward_steps += 1;
                if self.backward_steps == self.notify_at {
                    self.end_stop.notify();
                }
            }
            Ok(())
        }

        fn deactivate(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_callback_signal_alone_stops_homing() {
        let mut board = SimBoard::new();
        let input = board.input(5, Polarity::ActiveLow.pull()).unwrap();
        let end_stop = EndStop::new(input, Polarity::ActiveLow);
        let drive = MissedEdgeDrive {
            end_stop: end_stop.handle(),
            notify_at: 7,
            backward_steps: 0,
        };

        let mut stage = Stage::attach(drive, end_stop, StageLimits::new(-3, 10).unwrap())
            .unwrap()
            .with_homing_limit(100);

        assert_eq!(stage.home(), Ok(()));
        assert_eq!(stage.drive().backward_steps, 7);
        assert_eq!(stage.position(), Ok(-3));
        assert_eq!(stage.state(), StageState::Idle(-3));
        // The line still reads open; only the callback saw the closure.
        assert!(!stage.end_stop().triggered().unwrap());
    }

    #[test]
    fn test_release_deregisters_callback() {
        let (stage, _board) = rig(0, 10, 0, Polarity::ActiveLow);
        assert_eq!(stage.end_stop().callback_count(), 1);

        let (_track, end_stop) = stage.release();
        assert_eq!(end_stop.callback_count(), 0);
    }

    #[test]
    fn test_attach_fails_when_callback_table_full() {
        let (stage, _board) = rig(0, 10, 0, Polarity::ActiveLow);
        let (track, end_stop) = stage.release();
        for _ in 0..crate::endstop::MAX_CALLBACKS {
            end_stop.register_callback(Arc::new(|| {})).unwrap();
        }

        assert!(matches!(
            Stage::attach(track, end_stop, StageLimits::new(0, 10).unwrap()),
            Err(Error::EndStop(EndStopError::CallbackTableFull))
        ));
    }
}
