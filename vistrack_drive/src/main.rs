//! # vistrack Drive Binary
//!
//! Opens the motor drive and follows a stream of detector reports, one
//! JSON `ObjectPosition` per line.
//!
//! # Usage
//!
//! ```bash
//! # Follow a recorded detection log on the simulated board
//! vistrack-drive --simulate --input detections.ndjson
//!
//! # Real board, detector piped in on stdin
//! detector | vistrack-drive --config /etc/vistrack/drive.toml
//!
//! # Verbose JSON logs
//! vistrack-drive -s -v --json --input -
//! ```

#![deny(warnings)]

use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use vistrack_common::config::{ConfigError, ConfigLoader, DriveConfig, LogLevel};
use vistrack_common::consts::DEFAULT_CONFIG_PATH;
use vistrack_common::hal::transport::AlertTransport;
use vistrack_common::position::ObjectPosition;
use vistrack_drive::{ControlCore, Follower, MotorDevice};
use vistrack_hal::{BackendRegistry, NullTransport, create_transport};

/// vistrack drive - follow detector reports with the two-motor platform
#[derive(Parser, Debug)]
#[command(name = "vistrack-drive")]
#[command(version)]
#[command(about = "Motor control core driven by object detection reports")]
#[command(long_about = None)]
struct Args {
    /// Path to the drive configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the simulated board and drop alert messages
    #[arg(short = 's', long)]
    simulate: bool,

    /// Hardware backend to load (overrides `backend.name`)
    #[arg(short, long)]
    backend: Option<String>,

    /// Detection input, one JSON record per line ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Drive failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(&args.config);
    let log_level = match &loaded {
        Ok(Some(config)) => config.shared.log_level,
        _ => LogLevel::default(),
    };
    setup_tracing(&args, log_level);

    info!("vistrack drive v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded? {
        Some(config) => config,
        None => {
            warn!(
                "No configuration at {}, using board defaults",
                args.config.display()
            );
            DriveConfig::default()
        }
    };
    config.validate()?;

    let backend_name = if args.simulate {
        info!("Simulation mode enabled");
        "simulation".to_string()
    } else {
        args.backend.clone().unwrap_or_else(|| config.backend.name.clone())
    };
    let registry = BackendRegistry::with_builtin();
    let backend = registry.create_backend(&backend_name, &config)?;
    let transport: Box<dyn AlertTransport> = if args.simulate {
        Box::new(NullTransport::new())
    } else {
        create_transport(&config)
    };

    let follow = config.follow;
    let core = Arc::new(ControlCore::new(config, backend, transport)?);
    let device = MotorDevice::open(Arc::clone(&core))?;
    let mut follower = Follower::new(device, &follow);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let detections = spawn_reader(open_input(&args.input)?)?;
    let frames = until_stopped(&detections, &running);

    let result = follower.run(frames, &running);
    let summary = follower.finish();
    result?;

    info!(
        "vistrack drive stopped: {} frames, {} cycles, {} alerts",
        summary.frames,
        core.cycles(),
        core.alerts_raised()
    );
    Ok(())
}

/// Load the config file. `Ok(None)` when the file does not exist.
fn load_config(path: &Path) -> Result<Option<DriveConfig>, ConfigError> {
    match DriveConfig::load(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::FileNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

/// How often a blocked input is checked against the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn open_input(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    if path == Path::new("-") {
        info!("Reading detections from stdin");
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        info!("Reading detections from {}", path.display());
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Parse `input` on its own thread so a quiet input never blocks shutdown.
/// The channel disconnects at end of input or on a read error.
fn spawn_reader(input: Box<dyn BufRead + Send>) -> io::Result<Receiver<ObjectPosition>> {
    let (tx, rx) = mpsc::sync_channel(64);
    thread::Builder::new()
        .name("detection-reader".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Input read failed: {}", e);
                        break;
                    }
                };
                if let Some(position) = parse_frame(&line) {
                    if tx.send(position).is_err() {
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Frames from `detections` until the reader disconnects or `running`
/// clears, whichever comes first. Never blocks longer than
/// `STOP_POLL_INTERVAL` past a stop request.
fn until_stopped<'a>(
    detections: &'a Receiver<ObjectPosition>,
    running: &'a AtomicBool,
) -> impl Iterator<Item = ObjectPosition> + 'a {
    std::iter::from_fn(move || {
        while running.load(Ordering::SeqCst) {
            match detections.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(position) => return Some(position),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    })
}

/// One input line to a snapshot. Blank lines are skipped; malformed or
/// out-of-frame ones are logged and skipped.
fn parse_frame(line: &str) -> Option<ObjectPosition> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ObjectPosition>(line) {
        Ok(position) if position.in_frame() => Some(position),
        Ok(_) => {
            warn!("Skipping detection outside the frame '{}'", line);
            None
        }
        Err(e) => {
            warn!("Skipping malformed detection '{}': {}", line, e);
            None
        }
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive: Directive = if args.verbose {
        LevelFilter::DEBUG.into()
    } else {
        level
            .as_directive()
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into())
    };

    let filter = EnvFilter::from_default_env().add_directive(directive);

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
