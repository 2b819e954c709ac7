//! Stage module for linear-stage.
//!
//! Provides the homed, bounds-checked position controller.

mod controller;
mod state;

pub use controller::Stage;
pub use state::StageState;
