//! Deadlock detection
//!
//! - `history`: per-thread bounded signature windows
//! - `detector`: stability + blocking classification → verdict

pub mod detector;
pub mod history;

pub use detector::{
    confidence_for, DetectionResult, Detector, SuspectedThread, CONFIDENCE_SATURATION,
    MIN_DEADLOCK_THREADS,
};
pub use history::SignatureHistory;
