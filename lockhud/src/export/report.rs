use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;

use crate::classification::BlockingClassifier;
use crate::detection::DetectionResult;
use crate::domain::{ExportError, Pid, StackSignature};
use crate::dump::ProcessSnapshot;
use crate::monitor::RunMode;

/// A blocked thread as seen in one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BlockedThreadRecord {
    pub thread_id: String,
    pub thread_name: String,
    pub top_frame: String,
    pub signature: StackSignature,
}

/// Everything kept about one successful sample
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRecord {
    /// 1-based snapshot number within the run
    pub index: usize,
    pub timestamp: DateTime<Local>,
    pub thread_count: usize,
    pub blocked_count: usize,
    pub blocked_threads: Vec<BlockedThreadRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionResult>,
}

/// Top-level JSON document
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tool: &'static str,
    pub version: &'static str,
    pub pid: Pid,
    pub mode: RunMode,
    pub threshold: usize,
    pub interval_secs: f64,
    pub started_at: DateTime<Local>,
    pub snapshots_taken: usize,
    pub deadlocks_detected: usize,
    pub snapshots: Vec<SnapshotRecord>,
}

/// Collects snapshot records during a run and serializes them at the end
pub struct ReportExporter {
    report: RunReport,
}

impl ReportExporter {
    /// Create an exporter for a run starting now
    pub fn new(pid: Pid, mode: RunMode, threshold: usize, interval_secs: f64) -> Self {
        Self {
            report: RunReport {
                tool: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
                pid,
                mode,
                threshold,
                interval_secs,
                started_at: Local::now(),
                snapshots_taken: 0,
                deadlocks_detected: 0,
                snapshots: Vec::new(),
            },
        }
    }

    /// Record a successful snapshot
    pub fn record_snapshot(
        &mut self,
        index: usize,
        snapshot: &ProcessSnapshot,
        classifier: &BlockingClassifier,
    ) {
        let blocked_threads: Vec<BlockedThreadRecord> = snapshot
            .blocked_threads(classifier)
            .map(|t| BlockedThreadRecord {
                thread_id: t.thread_id().to_string(),
                thread_name: t.thread_name().to_string(),
                top_frame: t.top_frame().to_string(),
                signature: t.stack_signature(),
            })
            .collect();

        self.report.snapshots_taken += 1;
        self.report.snapshots.push(SnapshotRecord {
            index,
            timestamp: snapshot.timestamp,
            thread_count: snapshot.thread_count(),
            blocked_count: blocked_threads.len(),
            blocked_threads,
            detection: None,
        });
    }

    /// Attach a verdict to the most recently recorded snapshot
    pub fn record_detection(&mut self, result: &DetectionResult) {
        if result.is_deadlock {
            self.report.deadlocks_detected += 1;
        }
        if let Some(last) = self.report.snapshots.last_mut() {
            last.detection = Some(result.clone());
        }
    }

    /// Current report contents
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Write the report as pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, &self.report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
