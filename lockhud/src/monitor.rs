//! Sampling loop and mode controller
//!
//! Every mode is built on one primitive, [`Monitor::take_snapshot`]: invoke
//! the sampler, parse its output, count the snapshot. Sampler failures that
//! only affect one cycle are logged and skipped; fatal ones (tool missing,
//! permission denied) abort the run.
//!
//! ## Modes
//!
//! 1. **Single-shot** ([`Monitor::run_once`]): one snapshot, no detection
//! 2. **Fixed-sample** ([`Monitor::run_detection`]): `threshold` samples, one
//!    verdict on the last
//! 3. **Watch** ([`Monitor::run_watch`]): sample until interrupted, a verdict
//!    every cycle once enough samples are recorded
//!
//! The loop is strictly sequential. The only suspension points are the
//! sampler call and the inter-sample sleep, and both race the shutdown
//! future, so an interrupt never leaves a half-recorded cycle behind.

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::detection::{DetectionResult, Detector};
use crate::display;
use crate::domain::{MonitorError, Pid};
use crate::dump::{parse_dump, ProcessSnapshot};
use crate::export::ReportExporter;
use crate::preflight::check_process_exists;
use crate::sampler::StackSampler;

/// Operating mode selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Once,
    Detect,
    Watch,
}

impl RunMode {
    /// `--once` wins over `--watch`; neither selects fixed-sample detection
    #[must_use]
    pub fn from_flags(once: bool, watch: bool) -> Self {
        if once {
            RunMode::Once
        } else if watch {
            RunMode::Watch
        } else {
            RunMode::Detect
        }
    }
}

/// Loop timing and output settings
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub pid: Pid,
    /// Sleep between consecutive samples
    pub interval: Duration,
    /// Watch mode stops after this long (None = until interrupted)
    pub duration_limit: Option<Duration>,
    /// Print every thread of every snapshot
    pub verbose: bool,
    /// Skip per-snapshot output
    pub quiet: bool,
    /// End watch mode once the target process is gone
    pub stop_on_exit: bool,
}

impl MonitorConfig {
    #[must_use]
    pub fn new(pid: Pid, interval: Duration) -> Self {
        Self { pid, interval, duration_limit: None, verbose: false, quiet: false, stop_on_exit: false }
    }
}

/// One thread in the single-shot summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub name: String,
    pub blocked: bool,
    pub top_frame: String,
}

/// Result of single-shot mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnceSummary {
    pub thread_count: usize,
    pub blocked_count: usize,
    pub threads: Vec<ThreadSummary>,
}

/// Why watch mode stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    Interrupted,
    DurationLimit,
    ProcessExited,
}

impl fmt::Display for WatchExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchExit::Interrupted => f.write_str("interrupted"),
            WatchExit::DurationLimit => f.write_str("duration limit reached"),
            WatchExit::ProcessExited => f.write_str("process exited"),
        }
    }
}

/// Statistics reported when watch mode ends
#[derive(Debug, Clone)]
pub struct WatchSummary {
    pub snapshots_taken: usize,
    pub failed_cycles: usize,
    pub alerts_raised: usize,
    pub elapsed: Duration,
    pub exit_reason: WatchExit,
}

/// Drives the sampler, parser and detector for one target process.
pub struct Monitor<S> {
    config: MonitorConfig,
    sampler: S,
    detector: Detector,
    snapshot_count: usize,
    failed_cycles: usize,
    exporter: Option<ReportExporter>,
}

impl<S: StackSampler> Monitor<S> {
    pub fn new(config: MonitorConfig, sampler: S, detector: Detector) -> Self {
        Self { config, sampler, detector, snapshot_count: 0, failed_cycles: 0, exporter: None }
    }

    /// Collect a JSON report of the run alongside the terminal output
    #[must_use]
    pub fn with_exporter(mut self, exporter: ReportExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Take the report exporter out (used at the end of the run)
    pub fn take_exporter(&mut self) -> Option<ReportExporter> {
        self.exporter.take()
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Successful snapshots so far
    pub fn snapshot_count(&self) -> usize {
        self.snapshot_count
    }

    /// Cycles skipped because of a recoverable sampler or parse failure
    pub fn failed_cycles(&self) -> usize {
        self.failed_cycles
    }

    /// Invoke the sampler once and parse its output.
    ///
    /// Returns `Ok(None)` for a cycle that should be skipped (timeout,
    /// non-zero exit, output without any thread).
    ///
    /// # Errors
    /// Fatal sampler failures (tool missing, permission denied).
    pub async fn take_snapshot(&mut self) -> Result<Option<ProcessSnapshot>, MonitorError> {
        let raw = match self.sampler.sample(self.config.pid).await {
            Ok(raw) => raw,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!("Snapshot of {} failed: {e}", self.config.pid);
                self.failed_cycles += 1;
                return Ok(None);
            }
        };

        if raw.trim().is_empty() {
            warn!("Sampler returned no output for {}", self.config.pid);
            self.failed_cycles += 1;
            return Ok(None);
        }

        let snapshot = parse_dump(&raw);
        if snapshot.thread_count() == 0 {
            warn!("No threads recognized in sampler output ({} bytes), skipping cycle", raw.len());
            debug!("Unparsed sampler output:\n{raw}");
            self.failed_cycles += 1;
            return Ok(None);
        }

        self.snapshot_count += 1;
        if let Some(exporter) = self.exporter.as_mut() {
            exporter.record_snapshot(self.snapshot_count, &snapshot, self.detector.classifier());
        }
        Ok(Some(snapshot))
    }

    /// Single-shot mode: one snapshot, no detection and no history.
    ///
    /// # Errors
    /// Fatal sampler failures.
    pub async fn run_once(&mut self) -> Result<Option<OnceSummary>, MonitorError> {
        info!("Analyzing {}", self.config.pid);

        let Some(snapshot) = self.take_snapshot().await? else {
            return Ok(None);
        };
        self.show_snapshot(&snapshot);

        let classifier = self.detector.classifier();
        let threads: Vec<ThreadSummary> = snapshot
            .threads()
            .iter()
            .map(|t| ThreadSummary {
                thread_id: t.thread_id().to_string(),
                name: t.thread_name().to_string(),
                blocked: classifier.classify(t),
                top_frame: t.top_frame().to_string(),
            })
            .collect();

        Ok(Some(OnceSummary {
            thread_count: snapshot.thread_count(),
            blocked_count: threads.iter().filter(|t| t.blocked).count(),
            threads,
        }))
    }

    /// Fixed-sample mode: `threshold` samples `interval` apart, one verdict
    /// on the final snapshot.
    ///
    /// Every successful sample is recorded so the windows are full when the
    /// verdict is computed. Returns `None` when no sample succeeded or the
    /// run was interrupted.
    ///
    /// # Errors
    /// Fatal sampler failures.
    pub async fn run_detection(
        &mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<Option<DetectionResult>, MonitorError> {
        tokio::pin!(shutdown);
        let threshold = self.detector.threshold();

        if !self.config.quiet {
            display::print_detection_start(self.config.pid, self.config.interval, threshold);
        }

        let mut last: Option<ProcessSnapshot> = None;
        let mut verdict: Option<DetectionResult> = None;

        for i in 0..threshold {
            let is_last = i + 1 == threshold;
            if !self.config.quiet {
                display::print_sample_progress(i + 1, threshold);
            }

            let sampled = tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Detection interrupted after {} snapshots", self.snapshot_count);
                    return Ok(None);
                }
                res = self.take_snapshot() => res?,
            };

            if let Some(snapshot) = sampled {
                self.show_snapshot(&snapshot);
                if is_last {
                    verdict = Some(self.detector.detect(&snapshot));
                } else {
                    self.detector.observe(&snapshot);
                }
                last = Some(snapshot);
            }

            if !is_last && self.pause(shutdown.as_mut(), self.config.interval).await {
                info!("Detection interrupted after {} snapshots", self.snapshot_count);
                return Ok(None);
            }
        }

        // The final sample failed: judge the last one that succeeded
        let result = match (verdict, last) {
            (Some(result), _) => result,
            (None, Some(snapshot)) => self.detector.evaluate(&snapshot),
            (None, None) => {
                warn!("No snapshots collected from {}", self.config.pid);
                return Ok(None);
            }
        };

        self.report(&result);
        if !result.is_deadlock {
            display::print_no_deadlock(&result);
        }
        Ok(Some(result))
    }

    /// Watch mode: sample, record and judge every cycle until `shutdown`
    /// resolves or the duration limit passes.
    ///
    /// Verdicts start once `threshold` snapshots are recorded. A persisting
    /// deadlock is reported again on every cycle.
    ///
    /// # Errors
    /// Fatal sampler failures.
    pub async fn run_watch(
        &mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<WatchSummary, MonitorError> {
        tokio::pin!(shutdown);
        let threshold = self.detector.threshold();
        let started = Instant::now();
        let deadline = self.config.duration_limit.and_then(|limit| started.checked_add(limit));
        let mut alerts_raised = 0;

        if !self.config.quiet {
            display::print_watch_start(self.config.pid, self.config.interval, threshold);
        }

        let exit_reason = loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break WatchExit::DurationLimit;
            }

            let sampled = tokio::select! {
                biased;
                () = &mut shutdown => break WatchExit::Interrupted,
                res = self.take_snapshot() => res?,
            };

            let Some(snapshot) = sampled else {
                if self.config.stop_on_exit && check_process_exists(self.config.pid).is_err() {
                    break WatchExit::ProcessExited;
                }
                if self.pause(shutdown.as_mut(), self.wait_until(deadline)).await {
                    break WatchExit::Interrupted;
                }
                continue;
            };

            self.show_snapshot(&snapshot);
            if self.detector.samples_recorded() + 1 >= threshold {
                let result = self.detector.detect(&snapshot);
                self.report(&result);
                if result.is_deadlock {
                    alerts_raised += 1;
                    info!("Deadlock reported, monitoring continues");
                }
            } else {
                self.detector.observe(&snapshot);
            }

            if self.pause(shutdown.as_mut(), self.wait_until(deadline)).await {
                break WatchExit::Interrupted;
            }
        };

        Ok(WatchSummary {
            snapshots_taken: self.snapshot_count,
            failed_cycles: self.failed_cycles,
            alerts_raised,
            elapsed: started.elapsed(),
            exit_reason,
        })
    }

    /// Sleep for `wait`. Returns true if `shutdown` resolved first.
    async fn pause<F: Future<Output = ()>>(
        &self,
        shutdown: Pin<&mut F>,
        wait: Duration,
    ) -> bool {
        tokio::select! {
            biased;
            () = shutdown => true,
            () = tokio::time::sleep(wait) => false,
        }
    }

    /// The configured interval, cut short so a watch run ends on its deadline
    fn wait_until(&self, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(d) => self.config.interval.min(d.saturating_duration_since(Instant::now())),
            None => self.config.interval,
        }
    }

    fn show_snapshot(&self, snapshot: &ProcessSnapshot) {
        if !self.config.quiet {
            display::print_snapshot(
                snapshot,
                self.snapshot_count,
                self.detector.classifier(),
                self.config.verbose,
            );
        }
    }

    fn report(&mut self, result: &DetectionResult) {
        if result.is_deadlock {
            display::print_deadlock_alert(result);
        }
        if let Some(exporter) = self.exporter.as_mut() {
            exporter.record_detection(result);
        }
    }
}
