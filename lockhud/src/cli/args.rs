//! CLI argument definitions

use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::sampler::{DEFAULT_SAMPLER, DEFAULT_SAMPLER_TIMEOUT};

/// Sleep between samples when `--interval` is not given
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// A command-line duration given in (fractional) seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seconds(pub Duration);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_secs_f64())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "lockhud",
    version,
    about = "Detect deadlocked threads by comparing periodic stack dumps",
    after_help = "\
EXAMPLES:
    sudo lockhud 12345 --once                    Single snapshot of the current state
    sudo lockhud 12345                           Detect (3 samples, 5s apart)
    sudo lockhud 12345 -i 3 -t 5                 Custom interval and threshold
    sudo lockhud 12345 --watch --verbose         Continuous monitoring until Ctrl+C"
)]
pub struct Args {
    /// Process ID to monitor
    #[arg(value_name = "PID", value_parser = clap::value_parser!(i32).range(1..))]
    pub pid: i32,

    /// Seconds between samples
    #[arg(
        short,
        long,
        value_name = "SECS",
        default_value_t = Seconds(DEFAULT_INTERVAL),
        value_parser = parse_interval
    )]
    pub interval: Seconds,

    /// Consecutive identical samples before a thread counts as stuck
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub threshold: u32,

    /// Take a single snapshot and print the current state (no detection)
    #[arg(short = '1', long, conflicts_with = "watch")]
    pub once: bool,

    /// Monitor continuously until interrupted (Ctrl+C)
    #[arg(short, long)]
    pub watch: bool,

    /// Print every thread, not only blocked ones
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress per-snapshot output (alerts and summaries are still printed)
    #[arg(short, long)]
    pub quiet: bool,

    /// Stack sampler program, invoked as `<PROGRAM> dump --pid <PID>`
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_SAMPLER)]
    pub sampler: String,

    /// Seconds before a sampler invocation is abandoned
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = Seconds(DEFAULT_SAMPLER_TIMEOUT),
        value_parser = parse_timeout
    )]
    pub sampler_timeout: Seconds,

    /// Extra blocking-call regex, matched case-insensitively (repeatable)
    #[arg(long = "block-pattern", value_name = "REGEX")]
    pub block_patterns: Vec<String>,

    /// Stop watch mode after N seconds (0 = unlimited)
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub duration: u64,

    /// Write a JSON report of the run to FILE (one record per snapshot is
    /// kept in memory until the run ends)
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("`{s}` is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("`{s}` must be a non-negative, finite number of seconds"))
}

fn parse_interval(s: &str) -> Result<Seconds, String> {
    parse_seconds(s).map(Seconds)
}

fn parse_timeout(s: &str) -> Result<Seconds, String> {
    let timeout = parse_seconds(s)?;
    if timeout.is_zero() {
        return Err("sampler timeout must be greater than zero".to_string());
    }
    Ok(Seconds(timeout))
}
