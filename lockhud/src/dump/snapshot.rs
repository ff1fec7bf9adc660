//! Snapshot data models
//!
//! A [`ProcessSnapshot`] is built once per sampling cycle from one sampler
//! invocation and never mutated afterwards. Only the per-thread signatures
//! outlive it, inside the detector's history.

use chrono::{DateTime, Local};

use crate::classification::BlockingClassifier;
use crate::domain::StackSignature;

/// Sentinel returned by [`ThreadSnapshot::top_frame`] for an empty stack.
pub const UNKNOWN_FRAME: &str = "unknown";

/// One thread's call stack within one process sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSnapshot {
    thread_id: String,
    thread_name: String,
    state: String,
    stack_frames: Vec<String>,
    signature: StackSignature,
}

impl ThreadSnapshot {
    /// Create a thread snapshot. Frames are innermost first.
    ///
    /// A missing name is synthesized as `Thread-<thread_id>`.
    #[must_use]
    pub fn new(
        thread_id: impl Into<String>,
        thread_name: Option<String>,
        state: impl Into<String>,
        stack_frames: Vec<String>,
    ) -> Self {
        let thread_id = thread_id.into();
        let thread_name = thread_name.unwrap_or_else(|| format!("Thread-{thread_id}"));
        let signature = StackSignature::from_frames(&stack_frames);
        Self { thread_id, thread_name, state: state.into(), stack_frames, signature }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// State token from the dump header (`active`, `idle`, ...).
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn stack_frames(&self) -> &[String] {
        &self.stack_frames
    }

    /// Fingerprint of the ordered frame text.
    pub fn stack_signature(&self) -> StackSignature {
        self.signature
    }

    /// Innermost frame, or [`UNKNOWN_FRAME`] when the stack is empty.
    pub fn top_frame(&self) -> &str {
        self.stack_frames.first().map_or(UNKNOWN_FRAME, String::as_str)
    }
}

/// One sampling event: every thread of the target process at `timestamp`.
#[derive(Debug, Clone)]
pub struct ProcessSnapshot {
    pub timestamp: DateTime<Local>,
    threads: Vec<ThreadSnapshot>,
    raw_output: String,
}

impl ProcessSnapshot {
    /// Threads must already be unique by id; the parser guarantees this.
    #[must_use]
    pub fn new(timestamp: DateTime<Local>, threads: Vec<ThreadSnapshot>, raw_output: String) -> Self {
        Self { timestamp, threads, raw_output }
    }

    /// Threads in dump order
    pub fn threads(&self) -> &[ThreadSnapshot] {
        &self.threads
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Look up a thread by id
    pub fn thread(&self, thread_id: &str) -> Option<&ThreadSnapshot> {
        self.threads.iter().find(|t| t.thread_id == thread_id)
    }

    /// Unparsed sampler output, kept for diagnostics
    pub fn raw_output(&self) -> &str {
        &self.raw_output
    }

    /// Threads the classifier considers blocked, in dump order
    pub fn blocked_threads<'a>(
        &'a self,
        classifier: &'a BlockingClassifier,
    ) -> impl Iterator<Item = &'a ThreadSnapshot> + 'a {
        self.threads.iter().filter(move |t| classifier.classify(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thread_name() {
        let thread = ThreadSnapshot::new("0x7f00", None, "idle", vec![]);
        assert_eq!(thread.thread_name(), "Thread-0x7f00");
    }

    #[test]
    fn test_top_frame() {
        let thread = ThreadSnapshot::new(
            "1",
            Some("MainThread".into()),
            "active",
            vec!["wait (threading.py:320)".into(), "main (app.py:9)".into()],
        );
        assert_eq!(thread.top_frame(), "wait (threading.py:320)");
    }

    #[test]
    fn test_top_frame_unknown_for_empty_stack() {
        let thread = ThreadSnapshot::new("1", None, "idle", vec![]);
        assert_eq!(thread.top_frame(), UNKNOWN_FRAME);
    }

    #[test]
    fn test_signature_matches_frames() {
        let frames = vec!["acquire (threading.py:10)".to_string()];
        let thread = ThreadSnapshot::new("1", None, "active", frames.clone());
        assert_eq!(thread.stack_signature(), StackSignature::from_frames(&frames));
    }

    #[test]
    fn test_blocked_threads() {
        let snapshot = ProcessSnapshot::new(
            Local::now(),
            vec![
                ThreadSnapshot::new("1", None, "active", vec!["acquire (threading.py:10)".into()]),
                ThreadSnapshot::new("2", None, "active", vec!["compute (app.py:4)".into()]),
            ],
            String::new(),
        );
        let classifier = BlockingClassifier::default();
        let blocked: Vec<_> = snapshot.blocked_threads(&classifier).collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].thread_id(), "1");
        assert!(snapshot.thread("2").is_some());
        assert!(snapshot.thread("3").is_none());
    }
}
