//! Deadlock verdicts from stable, blocked stacks.
//!
//! A thread is *suspected* when its signature window is stable (unchanged
//! for `threshold` consecutive samples) and its current stack classifies as
//! blocked. Two or more suspects make a deadlock verdict; one stuck thread is
//! treated as ordinary blocking (e.g. waiting on I/O).

// Confidence is a ratio of small counts
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;
use std::num::NonZeroUsize;

use super::history::SignatureHistory;
use crate::classification::BlockingClassifier;
use crate::domain::StackSignature;
use crate::dump::ProcessSnapshot;

/// Minimum number of mutually stuck threads for a deadlock verdict.
pub const MIN_DEADLOCK_THREADS: usize = 2;

/// Suspect count at which confidence saturates at 1.0.
pub const CONFIDENCE_SATURATION: usize = 4;

/// A thread that contributed to a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspectedThread {
    pub thread_id: String,
    pub thread_name: String,
    pub top_frame: String,
    pub signature: StackSignature,
    /// Consecutive samples with the same blocked stack (the threshold)
    pub blocked_count: usize,
}

/// Per-snapshot detection output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub is_deadlock: bool,
    pub suspected_threads: Vec<SuspectedThread>,
    /// 0.0 - 1.0, linear in the suspect count
    pub confidence: f64,
    pub details: Vec<String>,
}

impl DetectionResult {
    /// Negative verdict with no suspects
    #[must_use]
    pub fn none() -> Self {
        Self { is_deadlock: false, suspected_threads: Vec::new(), confidence: 0.0, details: Vec::new() }
    }
}

/// Linear confidence, saturating at [`CONFIDENCE_SATURATION`] suspects.
#[must_use]
pub fn confidence_for(suspects: usize) -> f64 {
    (suspects as f64 / CONFIDENCE_SATURATION as f64).min(1.0)
}

/// Owns the signature history for one run and produces verdicts.
#[derive(Debug, Clone)]
pub struct Detector {
    classifier: BlockingClassifier,
    history: SignatureHistory,
    samples_recorded: usize,
}

impl Detector {
    #[must_use]
    pub fn new(threshold: NonZeroUsize, classifier: BlockingClassifier) -> Self {
        Self { classifier, history: SignatureHistory::new(threshold), samples_recorded: 0 }
    }

    /// Consecutive identical samples required before a thread is suspected
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.history.capacity()
    }

    #[must_use]
    pub fn classifier(&self) -> &BlockingClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn history(&self) -> &SignatureHistory {
        &self.history
    }

    /// Number of snapshots folded into the history so far
    #[must_use]
    pub fn samples_recorded(&self) -> usize {
        self.samples_recorded
    }

    /// Record every thread's signature without producing a verdict.
    pub fn observe(&mut self, snapshot: &ProcessSnapshot) {
        for thread in snapshot.threads() {
            self.history.record(thread.thread_id(), thread.stack_signature());
        }
        self.samples_recorded += 1;
    }

    /// Verdict for `snapshot` against the current history, without recording.
    #[must_use]
    pub fn evaluate(&self, snapshot: &ProcessSnapshot) -> DetectionResult {
        let threshold = self.threshold();
        let suspected_threads: Vec<SuspectedThread> = snapshot
            .threads()
            .iter()
            .filter(|t| self.history.is_stable(t.thread_id()) && self.classifier.classify(t))
            .map(|t| SuspectedThread {
                thread_id: t.thread_id().to_string(),
                thread_name: t.thread_name().to_string(),
                top_frame: t.top_frame().to_string(),
                signature: t.stack_signature(),
                blocked_count: threshold,
            })
            .collect();

        if suspected_threads.len() < MIN_DEADLOCK_THREADS {
            return DetectionResult { suspected_threads, ..DetectionResult::none() };
        }

        let count = suspected_threads.len();
        DetectionResult {
            is_deadlock: true,
            confidence: confidence_for(count),
            details: vec![format!(
                "{count} threads blocked at the same location for {threshold} consecutive samples"
            )],
            suspected_threads,
        }
    }

    /// Record `snapshot` into the history, then evaluate it.
    ///
    /// Each call must correspond to exactly one new sample.
    pub fn detect(&mut self, snapshot: &ProcessSnapshot) -> DetectionResult {
        self.observe(snapshot);
        self.evaluate(snapshot)
    }
}
