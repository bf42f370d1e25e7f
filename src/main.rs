//! Hydronauts - headless water network simulator
//!
//! Runs the telemetry core on its fixed cadence and logs a status line every
//! few ticks. The dashboard front end is not part of this binary.
//!
//! # Usage
//!
//! ```bash
//! # Default four-zone network, 500 ms ticks, until Ctrl+C
//! cargo run --release
//!
//! # Reproducible 200-tick run, final snapshot as JSON
//! cargo run --release -- --seed 42 --interval-ms 10 --ticks 200 --json
//! ```
//!
//! # Environment Variables
//!
//! - `HYDRONAUTS_CONFIG`: Path to a network TOML file
//! - `HYDRONAUTS_SEED`: Random seed (same as `--seed`)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hydronauts::config::{defaults, NetworkConfig};
use hydronauts::{Simulation, SimulationScheduler};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "hydronauts")]
#[command(about = "Hydronauts water distribution telemetry simulator")]
#[command(version)]
struct CliArgs {
    /// Network config file (skips the HYDRONAUTS_CONFIG / ./hydronauts.toml search)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for the random source; omit for OS entropy
    #[arg(long, env = "HYDRONAUTS_SEED")]
    seed: Option<u64>,

    /// Override the tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Stop after this many ticks (0 = run until Ctrl+C)
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<NetworkConfig> {
    let mut config = match &args.config {
        Some(path) => NetworkConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NetworkConfig::load(),
    };

    if let Some(seed) = args.seed {
        config.scheduler.seed = Some(seed);
    }
    if let Some(ms) = args.interval_ms {
        config.scheduler.tick_interval_ms = ms;
    }
    config.validate().context("Invalid network configuration")?;
    for w in config.range_warnings() {
        warn!("{}", w);
    }
    Ok(config)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let config = load_config(&args)?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Hydronauts - Water Distribution Telemetry Core");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for zone in &config.zones {
        info!(
            "  {} | base {:.1} bar | min ok {:.1} bar | valve {} | pump {}",
            zone.name,
            zone.base_pressure_bar,
            zone.min_ok_pressure_bar,
            if zone.valve_open { "open" } else { "closed" },
            zone.pump
        );
    }
    info!(
        interval_ms = config.scheduler.tick_interval_ms,
        seed = ?config.scheduler.seed,
        tick_limit = args.ticks,
        "Scheduler configured"
    );

    let simulation = Simulation::from_config(&config).context("Failed to build simulation")?;

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let (scheduler, handle) = SimulationScheduler::new(
        simulation,
        config.tick_interval(),
        config.scheduler.command_buffer,
        cancel_token.clone(),
    );
    let task = scheduler
        .with_tick_limit((args.ticks > 0).then_some(args.ticks))
        .spawn();

    let mut published = handle.subscribe();
    let mut last_status_tick = 0;
    loop {
        let changed = tokio::select! {
            () = cancel_token.cancelled() => break,
            changed = published.changed() => changed,
        };
        if changed.is_err() {
            if args.ticks == 0 {
                warn!("Scheduler stopped publishing");
            }
            break;
        }

        let tick = *published.borrow_and_update();
        if tick != last_status_tick && tick % defaults::STATUS_LOG_EVERY_TICKS == 0 {
            last_status_tick = tick;
            let snapshot = handle.snapshot();
            info!(
                tick,
                nrw_percent = snapshot.metrics.nrw_percent,
                energy_kwh = snapshot.metrics.energy_kwh,
                uptime_percent = snapshot.metrics.uptime_percent,
                active_anomalies = snapshot.metrics.active_anomalies,
                "{}",
                snapshot.status_line()
            );
        }
    }

    cancel_token.cancel();
    let simulation = task.await.context("Scheduler task failed")?;
    let snapshot = simulation.snapshot();

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{json}");
    }

    info!(
        tick = snapshot.tick,
        total_alerts = snapshot.metrics.total_alerts,
        active_anomalies = snapshot.metrics.active_anomalies,
        "Shutdown complete"
    );
    Ok(())
}
