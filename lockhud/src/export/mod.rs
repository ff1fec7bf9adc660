//! Run report export
//!
//! This module writes a JSON report of a monitoring run (one record per
//! snapshot plus every detection verdict) for later inspection or CI checks.

pub mod report;

pub use report::{ReportExporter, RunReport, SnapshotRecord};
