// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! WattLog - Power Telemetry Recorder
//!
//! Headless front-end: samples power draw, accumulates energy and cost,
//! persists the session as CSV and syncs it to the configured target.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use wattlog::core::{EventBus, EventPayload, TaskHandle};
use wattlog::sensors::{PowerSimulator, PowerSource, ReplaySource};
use wattlog::sync::{build_target, LocalOnly, SyncTarget, Trigger};
use wattlog::{build_info, Config, Monitor, VERSION};

/// WattLog - Power Telemetry Recorder
#[derive(Parser, Debug)]
#[command(name = "wattlog")]
#[command(author = "WattLog Project")]
#[command(version = VERSION)]
#[command(about = "Record power draw, energy and cost to CSV with background sync")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Price per kWh
    #[arg(long)]
    cost_rate: Option<f64>,

    /// Sampling cadence in milliseconds
    #[arg(long)]
    sample_interval_ms: Option<u64>,

    /// Sync cadence in milliseconds
    #[arg(long)]
    sync_interval_ms: Option<u64>,

    /// Points kept in the live history window
    #[arg(long)]
    history_capacity: Option<usize>,

    /// Local CSV sink path
    #[arg(long)]
    sink: Option<PathBuf>,

    /// Keep the sink local, ignoring the configured sync target
    #[arg(long)]
    no_sync: bool,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Replay the power column of a previously recorded CSV
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Export the session here after stopping
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Export the session to the configured export directory after stopping
    #[arg(long)]
    export: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)
        .with_context(|| format!("loading configuration from {:?}", config_path))?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("⚡ WattLog v{} - Power Telemetry Recorder", VERSION);
    debug!("Build: {:?}", build_info());
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if let Some(rate) = args.cost_rate {
        config.sampling.cost_rate = rate;
    }
    if let Some(ms) = args.sample_interval_ms {
        config.sampling.sample_interval_ms = ms;
    }
    if let Some(ms) = args.sync_interval_ms {
        config.sync.sync_interval_ms = ms;
    }
    if let Some(capacity) = args.history_capacity {
        config.sampling.history_capacity = capacity;
    }
    if let Some(sink) = args.sink.clone() {
        config.sync.sink_path = sink;
    }
    let export_dir = match args.export_dir.clone() {
        Some(dir) => Some(dir),
        None if args.export => Some(config.export_dir.clone()),
        None => None,
    };
    config.validate()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_headless(config, args, export_dir))
}

fn build_source(config: &Config, replay: Option<&PathBuf>) -> Result<Box<dyn PowerSource>> {
    match replay {
        Some(path) => {
            let source = ReplaySource::from_csv(path)?;
            if source.is_empty() {
                warn!("Replay file {:?} has no records, readings will be 0 W", path);
            }
            info!("Replaying {} readings from {:?}", source.len(), path);
            Ok(Box::new(source))
        }
        None => Ok(Box::new(PowerSimulator::new(
            "simulator",
            config.sampling.min_power_watts,
            config.sampling.max_power_watts,
        ))),
    }
}

/// Run one monitoring session without a GUI
async fn run_headless(config: Config, args: Args, export_dir: Option<PathBuf>) -> Result<()> {
    let source = build_source(&config, args.replay.as_ref())?;
    let target: Arc<dyn SyncTarget> = if args.no_sync {
        Arc::new(LocalOnly)
    } else {
        build_target(&config.sync.target)?
    };
    let mut monitor = Monitor::new(config, source, target)?;
    info!(
        "Sync target: {}, sink {:?}",
        monitor.sync_manager().target_name(),
        monitor.sync_manager().sink_path()
    );
    let display = TaskHandle::spawn("display", {
        let events = monitor.events();
        move |shutdown| show_totals(events, shutdown)
    });
    let log_panel = TaskHandle::spawn("log-panel", {
        let events = monitor.events();
        move |shutdown| log_events(events, shutdown)
    });

    let session_id = monitor.start()?;
    info!("🚀 Session {} running", session_id);
    match args.duration_secs {
        Some(secs) => info!("   Stopping after {}s (or Ctrl+C)", secs),
        None => info!("   Press Ctrl+C to stop"),
    }

    let run_for = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received, stopping...");
        }
        _ = run_for => info!("Run duration elapsed, stopping..."),
    }

    let report = monitor.stop().await?;
    info!("Recorded {} readings", report.records);

    if let Some(Trigger::Dispatched(handle)) = report.sync {
        let timeout = monitor.sync_manager().timeout() + Duration::from_secs(1);
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(sync)) if sync.is_success() => info!("Final sync finished in {:?}", sync.elapsed),
            Ok(Ok(sync)) => warn!("Final sync failed after {:?}", sync.elapsed),
            Ok(Err(e)) => warn!("Final sync task ended abnormally: {}", e),
            Err(_) => warn!("Final sync did not report within {:?}", timeout),
        }
    }

    if let Some(dir) = export_dir {
        match monitor.export(&dir) {
            Ok(path) => info!("Exported session to {:?}", path),
            Err(e) => warn!("Export failed: {}", e),
        }
    }

    let _ = display.stop().await;
    let _ = log_panel.stop().await;

    println!("{}", serde_json::to_string_pretty(&monitor.status())?);
    info!("WattLog shutdown complete");
    Ok(())
}

/// Log the running totals about once per second
async fn show_totals(events: Arc<EventBus>, mut shutdown: broadcast::Receiver<()>) {
    let mut totals = events.subscribe_totals();
    let mut last_shown: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            received = totals.recv() => match received {
                Ok(t) => {
                    if last_shown.map_or(true, |at| at.elapsed() >= Duration::from_secs(1)) {
                        last_shown = Some(Instant::now());
                        info!(
                            "{}  {:>5} W  {:.4} kWh  ${:.2}",
                            t.timestamp.format("%H:%M:%S"),
                            t.power_watts,
                            t.energy_kwh,
                            t.cost
                        );
                    }
                }
                Err(RecvError::Lagged(n)) => debug!("Display skipped {} updates", n),
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// Mirror lifecycle events into the log
async fn log_events(events: Arc<EventBus>, mut shutdown: broadcast::Receiver<()>) {
    let mut rx = events.subscribe_events();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            received = rx.recv() => match received {
                Ok(event) => match event.payload {
                    EventPayload::SyncDropped => debug!("[{}] sync request dropped", event.id),
                    payload => debug!("[{}] {:?}", event.id, payload),
                },
                Err(RecvError::Lagged(n)) => debug!("Log panel skipped {} events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }
}
