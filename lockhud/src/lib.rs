//! # lockhud - Deadlock Detection from Periodic Stack Dumps
//!
//! lockhud samples every thread's call stack of a running process at a fixed
//! interval (through an external sampler such as `py-spy dump`) and reports a
//! deadlock when several threads stay blocked at the same place across
//! consecutive samples.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Target Process                           │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ `py-spy dump --pid <PID>` (timeout)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     lockhud (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Sampler    │──▶│ Dump Parser  │──▶│   Detector   │         │
//! │  │  (command)   │   │  (snapshot)  │   │  (verdict)   │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │         ▲                                     │                 │
//! │         │           ┌──────────────┐   ┌──────┴───────┐         │
//! │         └───────────│   Monitor    │   │ Classifier + │         │
//! │                     │ (mode loop)  │   │   History    │         │
//! │                     └──────┬───────┘   └──────────────┘         │
//! │                            ▼                                    │
//! │              ┌──────────────┐   ┌──────────────┐                │
//! │              │   Display    │   │    Export    │                │
//! │              │  (terminal)  │   │ (report.json)│                │
//! │              └──────────────┘   └──────────────┘                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`dump`]: snapshot data model and the lenient dump parser
//! - [`classification`]: blocking-call pattern catalogue applied to the top frames
//! - [`detection`]: per-thread signature windows and the deadlock verdict
//! - [`monitor`]: single-shot, fixed-sample and watch modes
//! - [`sampler`]: the external sampler boundary (command with timeout)
//! - [`preflight`]: process existence and sampler lookup before the first cycle
//! - [`display`]: terminal output for snapshots, alerts and summaries
//! - [`export`]: JSON run report
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core domain types (`Pid`, `StackSignature`) and errors
//!
//! ## Detection Heuristic
//!
//! A thread is *suspected* when its stack signature was identical for the
//! last `threshold` samples and one of its top five frames matches a blocking
//! call (lock acquire, condition/event wait, queue get/put, ...). Two or more
//! suspects at once are reported as a deadlock, with confidence
//! `min(1.0, suspects / 4)`.
//!
//! This is a heuristic: it does not build a lock-wait graph, and a single
//! thread stuck on I/O is never reported on its own.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Current state of every thread
//! sudo lockhud 12345 --once
//!
//! # Three samples five seconds apart, one verdict
//! sudo lockhud 12345
//!
//! # Continuous monitoring with a JSON report
//! sudo lockhud 12345 --watch --export report.json
//! ```

pub mod classification;
pub mod cli;
pub mod detection;
pub mod display;
pub mod domain;
pub mod dump;
pub mod export;
pub mod monitor;
pub mod preflight;
pub mod sampler;
