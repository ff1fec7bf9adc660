//! External stack sampler boundary
//!
//! The engine never inspects the target process itself. Each cycle it asks a
//! [`StackSampler`] for one raw text dump and hands that to the parser.
//!
//! - `command`: runs an external tool (`py-spy dump --pid <PID>`) with a timeout
//! - `scripted`: replays canned results, for tests and offline runs

pub mod command;
pub mod scripted;

use std::future::Future;

use crate::domain::{Pid, SamplerError};

pub use command::{CommandSampler, DEFAULT_SAMPLER, DEFAULT_SAMPLER_TIMEOUT};
pub use scripted::ScriptedSampler;

/// Produces one raw stack dump of a process per call.
pub trait StackSampler {
    /// Capture the current stacks of every thread in `pid`.
    ///
    /// Implementations must return (with [`SamplerError::Timeout`] if needed)
    /// rather than block indefinitely.
    fn sample(&mut self, pid: Pid) -> impl Future<Output = Result<String, SamplerError>>;
}
