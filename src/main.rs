use std::io::{self, BufRead};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};

use linear_stage::sim::{SimBoard, SimulatedTrack, StdDelay};
use linear_stage::{
    load_config, parse_config, EndStop, Motor, Result, Stage, StageConfig, StepperDrive,
};

/// Wiring of the 28BYJ-48 / ULN2003 rig.
const DEFAULT_CONFIG: &str = r#"
min_limit = 0
max_limit = 4400

[motor]
drive_scheme = "half_step"
settle_ms = 10

[motor.pins]
a1 = 26
b1 = 19
a2 = 13
b2 = 6

[end_stop]
pin = 22
active_low = true
"#;

/// Drive a simulated linear stage from stdin
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stage configuration file; the built-in rig wiring when absent
    #[arg(short, long)]
    config: Option<String>,

    /// enable debug messages
    #[arg(short, long)]
    verbose: bool,

    /// Simulated track length in positions; the configured span when absent
    #[arg(long)]
    travel: Option<i64>,

    /// Simulated carriage start, 0 being the home switch; mid-track when absent
    #[arg(long)]
    start: Option<i64>,

    /// Sample the end stop on a background thread at this interval
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Override the configured settle delay
    #[arg(long)]
    settle_ms: Option<u32>,
}

enum Command {
    Move(i64),
    Home,
    End,
    Position,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Command::Home),
            "end" => Some(Command::End),
            "position" | "pos" => Some(Command::Position),
            "quit" | "exit" => Some(Command::Quit),
            other => other.parse().ok().map(Command::Move),
        }
    }
}

fn stage_config(args: &Args) -> Result<StageConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path);
            load_config(path)?
        }
        None => parse_config(DEFAULT_CONFIG)?,
    };
    if let Some(settle_ms) = args.settle_ms {
        config.motor.settle_ms = settle_ms;
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = stage_config(&args)?;
    let limits = config.limits()?;

    let mut board = SimBoard::new();
    let motor = Motor::from_config(&config.motor, &mut board, StdDelay)?;
    let end_stop = EndStop::from_config(&config.end_stop, &mut board)?;
    let switch = board.claimed_line(config.end_stop.pin)?;

    let polarity = end_stop.polarity();
    let track = match args.travel {
        Some(travel) => SimulatedTrack::new(motor, switch, polarity, travel),
        None => SimulatedTrack::spanning(motor, switch, polarity, limits)?,
    };
    let start = args.start.unwrap_or(track.travel() / 2);
    info!("Simulated track: {} positions, carriage at {}", track.travel(), start);
    let track = track.with_carriage(start);

    let _poller = args
        .poll_ms
        .map(|ms| end_stop.spawn_poller(Duration::from_millis(ms)));

    let mut stage = Stage::attach(track, end_stop, limits)?;
    if let Some(steps) = config.max_homing_steps {
        stage = stage.with_homing_limit(steps);
    }
    stage.home()?;

    info!(
        "Ready. Enter a position in [{}, {}], home, end, pos or quit",
        stage.min(),
        stage.max()
    );

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = match Command::parse(&line) {
            Some(Command::Move(target)) => stage.move_to(target),
            Some(Command::Home) => stage.home(),
            Some(Command::End) => stage.end(),
            Some(Command::Position) => stage.position().map(|position| {
                info!("Position: {}", position);
            }),
            Some(Command::Quit) => break,
            None => {
                warn!("Unrecognised command '{}'", line.trim());
                continue;
            }
        };

        if let Err(e) = result {
            error!("{}", e);
        }
    }

    let (mut track, _end_stop) = stage.release();
    track.deactivate()?;
    info!("Carriage parked at {}", track.carriage());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter(None, log::LevelFilter::Debug);
    } else {
        builder.filter(None, log::LevelFilter::Info);
    }
    builder.init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
