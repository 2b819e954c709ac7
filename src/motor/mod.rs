//! Motor module for linear-stage.
//!
//! Provides the winding outputs, drive-scheme tables and the unipolar stepper driver.

mod coil;
mod drive;
mod driver;

pub use coil::{Coil, Coils};
pub use drive::{DriveScheme, WindingState};
pub use driver::{Motor, StepperDrive, DEFAULT_SETTLE_MS};
