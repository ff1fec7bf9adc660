//! Stack dump model and parser
//!
//! - `snapshot`: immutable per-sample thread and process snapshots
//! - `parser`: lenient line-based parser for sampler output

pub mod parser;
pub mod snapshot;

pub use parser::parse_dump;
pub use snapshot::{ProcessSnapshot, ThreadSnapshot, UNKNOWN_FRAME};
