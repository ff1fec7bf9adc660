//! Terminal output for snapshots, alerts and run summaries

// Durations and confidences are shown rounded
#![allow(clippy::cast_precision_loss)]

use std::time::Duration;

use crate::classification::BlockingClassifier;
use crate::detection::DetectionResult;
use crate::domain::Pid;
use crate::dump::ProcessSnapshot;
use crate::monitor::{OnceSummary, WatchSummary};

const RULE_WIDTH: usize = 60;

/// Frames printed per blocked thread
const DISPLAYED_FRAMES: usize = 5;

/// Print one snapshot: blocked threads with their top frames, and every
/// thread when `verbose` is set.
pub fn print_snapshot(
    snapshot: &ProcessSnapshot,
    index: usize,
    classifier: &BlockingClassifier,
    verbose: bool,
) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{rule}");
    println!("[{}] snapshot #{index}", snapshot.timestamp.format("%H:%M:%S"));
    println!("threads: {}", snapshot.thread_count());
    println!("{rule}");

    let blocked: Vec<_> = snapshot.blocked_threads(classifier).collect();
    if !blocked.is_empty() {
        println!("\n[blocked threads: {}]", blocked.len());
        for thread in blocked {
            println!("\n  {} ({})", thread.thread_name(), thread.thread_id());
            println!("  signature: {}", thread.stack_signature());
            for (i, frame) in thread.stack_frames().iter().take(DISPLAYED_FRAMES).enumerate() {
                let prefix = if i == 0 { "  → " } else { "    " };
                println!("{prefix}{frame}");
            }
        }
    }

    if verbose {
        println!("\n[all threads]");
        for thread in snapshot.threads() {
            let status = if classifier.classify(thread) { " [BLOCKED]" } else { "" };
            println!(
                "  {} ({}): {}{status}",
                thread.thread_name(),
                thread.state(),
                thread.top_frame()
            );
        }
    }
}

/// Prominent banner for a positive verdict
pub fn print_deadlock_alert(result: &DetectionResult) {
    let bang = "!".repeat(RULE_WIDTH);
    let side = "!".repeat(20);
    println!("\n{bang}");
    println!("{side} DEADLOCK DETECTED {side}");
    println!("{bang}");
    println!("confidence: {:.0}%", result.confidence * 100.0);
    println!("details: {}", result.details.join(", "));

    println!("\n[suspected threads]");
    for suspect in &result.suspected_threads {
        println!("\n  thread: {} ({})", suspect.thread_name, suspect.thread_id);
        println!("  location: {}", suspect.top_frame);
        println!("  blocked: {} consecutive samples", suspect.blocked_count);
    }
    println!("\n{bang}");
}

/// Final line of a fixed-sample run without a deadlock
pub fn print_no_deadlock(result: &DetectionResult) {
    if result.suspected_threads.is_empty() {
        println!("\nresult: no deadlock detected");
    } else {
        println!(
            "\nresult: no deadlock detected ({} thread stuck, at least 2 required)",
            result.suspected_threads.len()
        );
    }
}

/// Header for fixed-sample detection
pub fn print_detection_start(pid: Pid, interval: Duration, threshold: usize) {
    println!("detecting deadlocks in {pid}");
    println!("interval: {:.1}s, threshold: {threshold} samples", interval.as_secs_f64());
    println!("estimated time: ~{:.0}s", interval.as_secs_f64() * threshold as f64);
}

/// Header for watch mode
pub fn print_watch_start(pid: Pid, interval: Duration, threshold: usize) {
    println!("watching {pid}");
    println!("interval: {:.1}s, threshold: {threshold} samples", interval.as_secs_f64());
    println!("stop: Ctrl+C");
}

/// Progress marker before each fixed-mode sample
pub fn print_sample_progress(current: usize, total: usize) {
    println!("\n[{current}/{total}] sampling...");
}

/// Counts printed at the end of single-shot mode
pub fn print_once_summary(summary: &OnceSummary) {
    println!(
        "\nthreads: {}, blocked: {}",
        summary.thread_count, summary.blocked_count
    );
}

/// Closing statistics for watch mode
pub fn print_watch_summary(summary: &WatchSummary) {
    eprintln!(
        "\n{}: {:.1}s, {} snapshots ({} failed cycles, {} deadlock alerts)",
        summary.exit_reason,
        summary.elapsed.as_secs_f64(),
        summary.snapshots_taken,
        summary.failed_cycles,
        summary.alerts_raised,
    );
}
