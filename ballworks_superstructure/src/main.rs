//! # Ballworks Superstructure
//!
//! Periodic coordinator for the ball-handling superstructure (lift, wrist,
//! intake). Loads the TOML configuration, wires the coordinator to the
//! subsystem handles, registers it with the fixed-period loop driver, and
//! runs until a shutdown signal arrives. Without hardware attached the
//! binary drives the recording sim subsystems.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use ballworks_superstructure::config::load_config;
use ballworks_superstructure::looper::Looper;
use ballworks_superstructure::subsystems::sim::{SimIntake, SimMechanism};
use ballworks_superstructure::superstructure::Superstructure;

/// Ballworks Superstructure: periodic ball-handling coordinator
#[derive(Parser, Debug)]
#[command(name = "ballworks_superstructure")]
#[command(version)]
#[command(about = "Periodic coordinator for the lift/wrist/intake superstructure")]
struct Args {
    /// Path to the superstructure configuration TOML.
    #[arg(default_value = "config/superstructure.toml")]
    config: PathBuf,

    /// Override the configured loop period [ms].
    #[arg(long)]
    period_ms: Option<u32>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!(
        "Ballworks Superstructure v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Ballworks Superstructure shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;
    if let Some(period_ms) = args.period_ms {
        config.loop_config.period_ms = period_ms;
        config.validate()?;
    }
    info!(
        "Config OK: period={}ms, carry_after_pickup={}",
        config.loop_config.period_ms, config.policy.carry_after_pickup
    );

    // Subsystem handles. Sim implementations stand in for hardware.
    let lift = Arc::new(SimMechanism::new("lift"));
    let wrist = Arc::new(SimMechanism::new("wrist"));
    let intake = Arc::new(SimIntake::new());

    let superstructure = Arc::new(Superstructure::new(
        lift,
        wrist,
        intake,
        config.setpoints,
        config.policy,
    ));

    let mut looper = Looper::new(Duration::from_millis(u64::from(
        config.loop_config.period_ms,
    )))
    .with_rt_options(config.loop_config.rt_cpu_core, config.loop_config.rt_priority);
    looper.register(superstructure.clone())?;
    looper.start()?;

    // Block until a shutdown signal arrives.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    // Stopping the driver runs on_stop, which idles all subsystems.
    let stats = looper.stop()?;
    info!(
        ticks = stats.tick_count,
        overruns = stats.overruns,
        "final loop statistics"
    );

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
