//! Lenient parser for textual stack dumps.
//!
//! The expected shape is the `py-spy dump` layout:
//!
//! ```text
//! Process 4242: python worker.py
//! Python v3.11.4 (/usr/bin/python3.11)
//!
//! Thread 0x7F3A2C1B8740 (idle): "MainThread"
//!     wait (threading.py:320)
//!     join (threading.py:1096)
//!     main (worker.py:41)
//! Thread 4243 (active)
//!     acquire (locks.py:12)
//! ```
//!
//! A header line opens a new thread, indented `descriptor (file:line)` lines
//! are its frames (innermost first). Anything else is skipped, so banner lines,
//! blank lines and sampler version drift never make parsing fail.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::Local;
use log::debug;
use regex::Regex;

use super::snapshot::{ProcessSnapshot, ThreadSnapshot};

/// `Thread <hex|dec id> (<state>): "<name>"`, name optional
static THREAD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Thread\s+(0x[0-9a-fA-F]+|\d+)\s+\(([^)]+)\)(?::\s+"([^"]*)")?"#)
        .expect("thread header regex is valid")
});

/// Indented `<descriptor> (<file>:<line>)`
static STACK_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(.+\s+\(.+:\d+\))").expect("stack frame regex is valid")
});

/// Thread block being accumulated while scanning
struct PendingThread {
    id: String,
    name: Option<String>,
    state: String,
    frames: Vec<String>,
}

impl PendingThread {
    fn finish(self) -> ThreadSnapshot {
        ThreadSnapshot::new(self.id, self.name, self.state, self.frames)
    }
}

/// Parse raw sampler output into a snapshot stamped with the current time.
///
/// Never fails: input without any recognizable thread header yields a
/// snapshot with zero threads. If the same thread id appears twice, the
/// first block is kept.
#[must_use]
pub fn parse_dump(raw_output: &str) -> ProcessSnapshot {
    let mut threads: Vec<ThreadSnapshot> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<PendingThread> = None;

    let mut flush = |pending: PendingThread, threads: &mut Vec<ThreadSnapshot>| {
        if seen.insert(pending.id.clone()) {
            threads.push(pending.finish());
        } else {
            debug!("Dropping duplicate thread block for id {}", pending.id);
        }
    };

    for line in raw_output.lines() {
        if let Some(caps) = THREAD_HEADER.captures(line) {
            if let Some(pending) = current.take() {
                flush(pending, &mut threads);
            }
            current = Some(PendingThread {
                id: caps[1].to_string(),
                name: caps.get(3).map(|m| m.as_str()).filter(|n| !n.is_empty()).map(str::to_string),
                state: caps[2].trim().to_string(),
                frames: Vec::new(),
            });
            continue;
        }

        let Some(pending) = current.as_mut() else {
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(caps) = STACK_FRAME.captures(line) {
            pending.frames.push(caps[1].trim().to_string());
        }
    }

    if let Some(pending) = current.take() {
        flush(pending, &mut threads);
    }

    ProcessSnapshot::new(Local::now(), threads, raw_output.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::snapshot::UNKNOWN_FRAME;

    const SAMPLE_DUMP: &str = r#"Process 4242: python worker.py
Python v3.11.4 (/usr/bin/python3.11)

Thread 0x7F3A2C1B8740 (idle): "MainThread"
    wait (threading.py:320)
    join (threading.py:1096)
    main (worker.py:41)
Thread 4243 (active)
    acquire (locks.py:12)
Thread 0x7F3A2A000640 (gil): "Worker-1"
"#;

    #[test]
    fn test_parse_sample_dump() {
        let snapshot = parse_dump(SAMPLE_DUMP);
        assert_eq!(snapshot.thread_count(), 3);

        let main = &snapshot.threads()[0];
        assert_eq!(main.thread_id(), "0x7F3A2C1B8740");
        assert_eq!(main.thread_name(), "MainThread");
        assert_eq!(main.state(), "idle");
        assert_eq!(
            main.stack_frames(),
            ["wait (threading.py:320)", "join (threading.py:1096)", "main (worker.py:41)"]
        );

        let unnamed = &snapshot.threads()[1];
        assert_eq!(unnamed.thread_id(), "4243");
        assert_eq!(unnamed.thread_name(), "Thread-4243");
        assert_eq!(unnamed.top_frame(), "acquire (locks.py:12)");

        let last = &snapshot.threads()[2];
        assert_eq!(last.thread_name(), "Worker-1");
        assert!(last.stack_frames().is_empty());
        assert_eq!(last.top_frame(), UNKNOWN_FRAME);
    }

    #[test]
    fn test_raw_output_retained() {
        let snapshot = parse_dump(SAMPLE_DUMP);
        assert_eq!(snapshot.raw_output(), SAMPLE_DUMP);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_dump("").thread_count(), 0);
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let raw = "garbage\n    not a frame\n\n\tstill (nothing\nThreadless 0x1 (idle)\n";
        assert_eq!(parse_dump(raw).thread_count(), 0);
    }

    #[test]
    fn test_frames_before_first_header_are_ignored() {
        let raw = "    orphan (x.py:1)\nThread 1 (active)\n    real (y.py:2)\n";
        let snapshot = parse_dump(raw);
        assert_eq!(snapshot.thread_count(), 1);
        assert_eq!(snapshot.threads()[0].stack_frames(), ["real (y.py:2)"]);
    }

    #[test]
    fn test_decorative_lines_inside_block_are_skipped() {
        let raw = "Thread 1 (active)\n    a (x.py:1)\n    Arguments:\n        self: <Foo>\n    b (x.py:2)\n";
        let snapshot = parse_dump(raw);
        assert_eq!(snapshot.threads()[0].stack_frames(), ["a (x.py:1)", "b (x.py:2)"]);
    }

    #[test]
    fn test_empty_quoted_name_gets_default() {
        let snapshot = parse_dump("Thread 7 (idle): \"\"\n");
        assert_eq!(snapshot.threads()[0].thread_name(), "Thread-7");
    }

    #[test]
    fn test_duplicate_thread_id_keeps_first_block() {
        let raw = "Thread 1 (active)\n    a (x.py:1)\nThread 1 (idle)\n    b (x.py:2)\n";
        let snapshot = parse_dump(raw);
        assert_eq!(snapshot.thread_count(), 1);
        assert_eq!(snapshot.threads()[0].top_frame(), "a (x.py:1)");
    }

    #[test]
    fn test_crlf_line_endings() {
        let raw = "Thread 1 (active): \"Main\"\r\n    a (x.py:1)\r\n";
        let snapshot = parse_dump(raw);
        assert_eq!(snapshot.threads()[0].thread_name(), "Main");
        assert_eq!(snapshot.threads()[0].stack_frames(), ["a (x.py:1)"]);
    }
}
