//! Per-thread sliding windows of stack signatures.
//!
//! # Memory Usage
//!
//! - O(threshold) signatures per thread id, 8 bytes each
//! - Thread ids are never evicted, so the number of windows grows with the
//!   number of distinct ids seen during a run

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

use crate::domain::StackSignature;

/// Bounded, chronologically ordered signature windows keyed by thread id.
///
/// Threads absent from a sample keep their window untouched. A thread id that
/// disappears and later reappears resumes the window it had, even if the id
/// now belongs to a different underlying thread.
#[derive(Debug, Clone)]
pub struct SignatureHistory {
    capacity: NonZeroUsize,
    windows: HashMap<String, VecDeque<StackSignature>>,
}

impl SignatureHistory {
    /// Create an empty history whose windows hold at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { capacity, windows: HashMap::new() }
    }

    /// Maximum window length (the detection threshold)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Append a signature to the thread's window, evicting the oldest entry
    /// when the window is already full.
    pub fn record(&mut self, thread_id: &str, signature: StackSignature) {
        let capacity = self.capacity.get();
        let window = self
            .windows
            .entry(thread_id.to_string())
            .or_insert_with(VecDeque::new);

        if window.len() == capacity {
            window.pop_front();
        }
        window.push_back(signature);
    }

    /// True only when the window is full and every entry is identical,
    /// i.e. the stack did not change over the last `capacity` samples.
    #[must_use]
    pub fn is_stable(&self, thread_id: &str) -> bool {
        let Some(window) = self.windows.get(thread_id) else {
            return false;
        };
        if window.len() < self.capacity.get() {
            return false;
        }
        window.iter().all(|sig| Some(sig) == window.front())
    }

    /// Current window of a thread, oldest first. Empty for unknown ids.
    pub fn window(&self, thread_id: &str) -> impl Iterator<Item = &StackSignature> + '_ {
        self.windows.get(thread_id).into_iter().flatten()
    }

    /// Current window length of a thread (0 for unknown ids)
    #[must_use]
    pub fn window_len(&self, thread_id: &str) -> usize {
        self.windows.get(thread_id).map_or(0, VecDeque::len)
    }

    /// Number of distinct thread ids ever recorded
    #[must_use]
    pub fn tracked_threads(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(text: &str) -> StackSignature {
        StackSignature::from_frames(&[text])
    }

    fn history(capacity: usize) -> SignatureHistory {
        SignatureHistory::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_new_thread_starts_empty() {
        let history = history(3);
        assert_eq!(history.window_len("1"), 0);
        assert!(!history.is_stable("1"));
        assert_eq!(history.window("1").count(), 0);
    }

    #[test]
    fn test_window_is_bounded_and_fifo() {
        let mut history = history(3);
        for text in ["a", "b", "c", "d", "e"] {
            history.record("1", sig(text));
        }
        assert_eq!(history.window_len("1"), 3);
        let window: Vec<_> = history.window("1").copied().collect();
        assert_eq!(window, vec![sig("c"), sig("d"), sig("e")]);
    }

    #[test]
    fn test_stable_requires_full_window() {
        let mut history = history(3);
        history.record("1", sig("a"));
        history.record("1", sig("a"));
        assert!(!history.is_stable("1"));
        history.record("1", sig("a"));
        assert!(history.is_stable("1"));
    }

    #[test]
    fn test_any_difference_breaks_stability() {
        let mut history = history(3);
        for text in ["a", "b", "a"] {
            history.record("1", sig(text));
        }
        assert!(!history.is_stable("1"));

        // Once the odd entry is evicted the window is stable again
        history.record("1", sig("a"));
        assert!(!history.is_stable("1"));
        history.record("1", sig("a"));
        assert!(history.is_stable("1"));
    }

    #[test]
    fn test_threshold_of_one_is_stable_after_first_record() {
        let mut history = history(1);
        history.record("1", sig("a"));
        assert!(history.is_stable("1"));
    }

    #[test]
    fn test_huge_threshold_grows_window_lazily() {
        #[allow(clippy::cast_possible_truncation)]
        let mut history = history(u32::MAX as usize);
        history.record("1", sig("a"));
        history.record("1", sig("a"));
        assert_eq!(history.window_len("1"), 2);
        assert!(!history.is_stable("1"));
    }

    #[test]
    fn test_threads_are_independent() {
        let mut history = history(2);
        history.record("1", sig("a"));
        history.record("1", sig("a"));
        history.record("2", sig("a"));
        assert!(history.is_stable("1"));
        assert!(!history.is_stable("2"));
        assert_eq!(history.tracked_threads(), 2);
    }
}
