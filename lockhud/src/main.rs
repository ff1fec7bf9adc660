//! # lockhud - Main Entry Point
//!
//! Supports three operational modes:
//! - **Single-shot** (`--once`): one snapshot of every thread, no detection
//! - **Detection** (default): `--threshold` samples `--interval` seconds apart, one verdict
//! - **Watch** (`--watch`): continuous sampling with a verdict every cycle until Ctrl+C

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::time::Duration;

use lockhud::classification::BlockingClassifier;
use lockhud::cli::Args;
use lockhud::detection::Detector;
use lockhud::display;
use lockhud::domain::{MonitorError, Pid};
use lockhud::export::ReportExporter;
use lockhud::monitor::{Monitor, MonitorConfig, RunMode};
use lockhud::preflight::run_preflight_checks;
use lockhud::sampler::CommandSampler;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_ERROR
        }
    });
}

/// Resolves on Ctrl+C. If the handler cannot be installed the run is only
/// stopped by its own limits.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();
    let pid = Pid(args.pid);
    let mode = RunMode::from_flags(args.once, args.watch);

    // Pre-flight: target process and sampler must exist
    run_preflight_checks(pid, &args.sampler, args.quiet)?;

    let classifier = BlockingClassifier::with_extra_patterns(&args.block_patterns)
        .map_err(MonitorError::from)?;
    let threshold = usize::try_from(args.threshold)
        .ok()
        .and_then(NonZeroUsize::new)
        .context("Threshold must be at least 1")?;

    let interval = args.interval.0;
    let mut config = MonitorConfig::new(pid, interval);
    config.verbose = args.verbose;
    config.quiet = args.quiet;
    config.stop_on_exit = true;
    config.duration_limit = (args.duration > 0).then(|| Duration::from_secs(args.duration));

    if !args.quiet {
        println!("lockhud v{}", env!("CARGO_PKG_VERSION"));
        println!("pid: {}", pid.0);
        println!("sampler: {}", args.sampler);
    }

    let sampler = CommandSampler::new(args.sampler.clone(), args.sampler_timeout.0);
    let detector = Detector::new(threshold, classifier);
    let mut monitor = Monitor::new(config, sampler, detector);
    if args.export.is_some() {
        monitor = monitor.with_exporter(ReportExporter::new(
            pid,
            mode,
            threshold.get(),
            interval.as_secs_f64(),
        ));
    }

    match mode {
        RunMode::Once => match monitor.run_once().await? {
            Some(summary) => display::print_once_summary(&summary),
            None => eprintln!("warning: no snapshot collected from {pid}"),
        },
        RunMode::Detect => {
            if monitor.run_detection(ctrl_c()).await?.is_none() {
                eprintln!("warning: detection finished without a verdict");
            }
        }
        RunMode::Watch => {
            let summary = monitor.run_watch(ctrl_c()).await?;
            display::print_watch_summary(&summary);
        }
    }

    // Export report if enabled
    if let (Some(exporter), Some(export_path)) = (monitor.take_exporter(), args.export.as_ref()) {
        let file = File::create(export_path).context("Failed to create report file")?;
        exporter.export(BufWriter::new(file)).context("Failed to export report")?;

        if !args.quiet {
            println!("saved: {}", export_path.display());
        }
    }

    Ok(())
}
