//! Blocking-call classification for thread stacks.
//!
//! A thread is considered *blocked* when one of its innermost frames looks
//! like a wait on a concurrency primitive. The check is purely textual: each
//! of the top [`MAX_CLASSIFIED_FRAMES`] frames is matched, case-insensitively,
//! against a catalogue of blocking-call patterns.
//!
//! # Classification Strategy
//!
//! 1. **Top frames only** - the immediate cause of a wait lives near the top
//!    of the stack, deeper frames are callers and are ignored
//! 2. **Pattern catalogue** - lock acquisition, generic waits, queue put/get,
//!    semaphores and events, see [`BLOCKING_PATTERNS`]
//! 3. **User extensions** - extra patterns (`--block-pattern`) are compiled
//!    into the same set and evaluated the same way

use regex::{RegexSet, RegexSetBuilder};
use std::sync::LazyLock;

use crate::dump::ThreadSnapshot;

/// Number of innermost frames inspected per thread.
pub const MAX_CLASSIFIED_FRAMES: usize = 5;

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Blocking-call signatures, matched case-insensitively against frame text.
pub const BLOCKING_PATTERNS: &[&str] = &[
    r"acquire",
    r"_wait",
    r"wait_for",
    r"\.get\(",
    r"\.put\(",
    r"lock\.",
    r"Queue\.",
    r"Event\.wait",
    r"Condition\.wait",
    r"Semaphore\.acquire",
];

static DEFAULT_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(BLOCKING_PATTERNS.iter().copied()).expect("blocking pattern catalogue is valid")
});

fn build_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<RegexSet, regex::Error> {
    RegexSetBuilder::new(patterns).case_insensitive(true).build()
}

/// Decides whether a thread's stack indicates it is waiting on a primitive.
///
/// Classification is a pure function of the stack text: the same frames
/// always yield the same answer.
#[derive(Debug, Clone)]
pub struct BlockingClassifier {
    patterns: RegexSet,
}

impl Default for BlockingClassifier {
    fn default() -> Self {
        Self { patterns: DEFAULT_SET.clone() }
    }
}

impl BlockingClassifier {
    /// Built-in catalogue plus `extra` user patterns.
    ///
    /// # Errors
    /// Returns the regex error of the first pattern that fails to compile.
    pub fn with_extra_patterns<S: AsRef<str>>(extra: &[S]) -> Result<Self, regex::Error> {
        if extra.is_empty() {
            return Ok(Self::default());
        }
        let patterns = build_set(
            BLOCKING_PATTERNS.iter().copied().chain(extra.iter().map(AsRef::<str>::as_ref)),
        )?;
        Ok(Self { patterns })
    }

    /// Number of patterns in the catalogue (built-in plus extra)
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if a single frame matches any blocking pattern.
    #[must_use]
    pub fn is_blocking_frame(&self, frame: &str) -> bool {
        self.patterns.is_match(frame)
    }

    /// Returns true if any of the top [`MAX_CLASSIFIED_FRAMES`] frames blocks.
    #[must_use]
    pub fn classify(&self, thread: &ThreadSnapshot) -> bool {
        self.classify_frames(thread.stack_frames())
    }

    /// Same as [`classify`](Self::classify) on a bare frame list (innermost first).
    #[must_use]
    pub fn classify_frames<S: AsRef<str>>(&self, frames: &[S]) -> bool {
        frames
            .iter()
            .take(MAX_CLASSIFIED_FRAMES)
            .any(|frame| self.is_blocking_frame(frame.as_ref()))
    }
}
