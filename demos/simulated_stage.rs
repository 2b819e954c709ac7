//! Example: Homing and moving a stage on the simulated board.
//!
//! This example demonstrates how to:
//! - Parse a stage configuration from TOML
//! - Claim motor and end-stop channels from an `IoContext`
//! - Home the stage against its end stop and move between positions
//!
//! Run with: `cargo run --example simulated_stage`

use linear_stage::{
    error::Result,
    parse_config,
    sim::{SimBoard, SimulatedTrack, StdDelay},
    EndStop, Motor, Stage,
};

fn main() -> Result<()> {
    println!("=== Simulated Stage Example ===\n");

    // Same wiring as stage.toml, with a short track and no settle delay.
    let config = parse_config(
        r#"
min_limit = 0
max_limit = 200

[motor]
drive_scheme = "half_step"
settle_ms = 0

[motor.pins]
a1 = 26
b1 = 19
a2 = 13
b2 = 6

[end_stop]
pin = 22
active_low = true
"#,
    )?;
    let limits = config.limits()?;

    println!("Stage Configuration:");
    println!("  Limits: [{}, {}]", limits.min(), limits.max());
    println!("  Drive scheme: {}", config.motor.drive_scheme()?);
    println!("  End stop: channel {}, {:?}", config.end_stop.pin, config.end_stop.polarity());

    let mut board = SimBoard::new();
    let motor = Motor::from_config(&config.motor, &mut board, StdDelay)?;
    let end_stop = EndStop::from_config(&config.end_stop, &mut board)?;
    let switch = board.claimed_line(config.end_stop.pin)?;

    // Start the carriage somewhere along the track so homing has work to do.
    let track = SimulatedTrack::spanning(motor, switch, end_stop.polarity(), limits)?
        .with_carriage(120);

    let mut stage = Stage::new(track, end_stop, limits)?;
    println!(
        "\nHomed after {} backward cycles, position {}",
        stage.drive().backward_cycles(),
        stage.position()?
    );

    for target in [50, 180, 10] {
        stage.move_to(target)?;
        println!("Moved to {} (carriage at {})", stage.position()?, stage.drive().carriage());
    }

    match stage.move_to(500) {
        Ok(()) => println!("Unexpectedly moved out of range"),
        Err(e) => println!("Rejected: {}", e),
    }

    stage.end()?;
    println!("At end: {}", stage.position()?);

    stage.home()?;
    println!("Back home: {}, state {}", stage.position()?, stage.state());

    println!("\n=== Example Complete ===");
    Ok(())
}
