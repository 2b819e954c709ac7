//! Configuration module for linear-stage.
//!
//! Provides types for loading and validating a stage description (winding and
//! end-stop channels, drive scheme, settle delay, travel limits) from TOML.

mod endstop;
mod limits;
mod loader;
mod motor;
mod stage;
mod validation;

pub use endstop::EndStopConfig;
pub use limits::StageLimits;
pub use loader::{load_config, parse_config};
pub use motor::{CoilPins, MotorConfig};
pub use stage::StageConfig;
pub use validation::validate_config;
