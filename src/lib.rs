//! # linear-stage
//!
//! Homed, bounds-checked position control for a stepper-driven linear stage, with
//! embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Drive schemes**: wave, full-step and half-step excitation of a unipolar stepper
//! - **embedded-hal 1.0**: `OutputPin` for windings, `InputPin` for the end stop,
//!   `DelayNs` for settling
//! - **Homing**: the zero reference comes from a limit switch at the `min` end of travel
//! - **Bounds checking**: moves outside `[min, max]` are refused before any motion
//! - **Configuration-driven**: wiring, drive scheme and limits from a TOML file
//! - **Simulation**: an in-memory board and track for running without hardware
//!
//! ## Quick Start
//!
//! ```rust
//! use linear_stage::sim::{SimBoard, SimulatedTrack, StdDelay};
//! use linear_stage::{parse_config, EndStop, Motor, Stage};
//!
//! let config = parse_config(
//!     r#"
//! min_limit = 0
//! max_limit = 40
//!
//! [motor]
//! settle_ms = 0
//! pins = { a1 = 26, b1 = 19, a2 = 13, b2 = 6 }
//!
//! [end_stop]
//! pin = 22
//! active_low = true
//! "#,
//! )?;
//! let limits = config.limits()?;
//!
//! // Claim the pins from a simulated board and put the carriage on a track
//! let mut board = SimBoard::new();
//! let motor = Motor::from_config(&config.motor, &mut board, StdDelay)?;
//! let end_stop = EndStop::from_config(&config.end_stop, &mut board)?;
//! let switch = board.claimed_line(config.end_stop.pin)?;
//! let track = SimulatedTrack::spanning(motor, switch, end_stop.polarity(), limits)?
//!     .with_carriage(25);
//!
//! // Homes against the end stop
//! let mut stage = Stage::new(track, end_stop, limits)?;
//! assert_eq!(stage.position()?, 0);
//!
//! stage.move_to(30)?;
//! assert_eq!(stage.position()?, 30);
//! stage.end()?;
//! # Ok::<(), linear_stage::Error>(())
//! ```
//!
//! With real hardware, [`Stage::from_config`] claims the pins from any [`IoContext`]
//! and homes in one call. See `demos/simulated_stage.rs` for a longer walk-through.
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `linear-stage` command line front end

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - heapless strings in ConfigError
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod endstop;
pub mod error;
pub mod io;
pub mod motor;
pub mod sim;
pub mod stage;

// Re-exports for ergonomic API
pub use config::{load_config, parse_config, validate_config, StageConfig, StageLimits};
pub use endstop::{Callback, EndStop, EndStopHandle, HomeSignal, Polarity, Poller};
pub use error::{Error, Result};
pub use io::{IoContext, Pull};
pub use motor::{Coil, Coils, DriveScheme, Motor, StepperDrive, WindingState};
pub use stage::{Stage, StageState};
