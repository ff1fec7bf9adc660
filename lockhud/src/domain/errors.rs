//! Structured error types for lockhud
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::Pid;
use std::time::Duration;
use thiserror::Error;

/// Failure of one external sampler invocation.
///
/// Whether the run can continue depends on the variant, see [`SamplerError::is_fatal`].
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Sampler timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Sampler `{program}` not found. Install it with: pip install py-spy")]
    ToolNotFound { program: String },

    #[error("Permission denied running `{program}`. Run with sudo or grant CAP_SYS_PTRACE")]
    PermissionDenied { program: String },

    #[error("Sampler exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SamplerError {
    /// Fatal errors abort the whole run; everything else skips one cycle.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SamplerError::ToolNotFound { .. } | SamplerError::PermissionDenied { .. })
    }
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Process {0} not found")]
    ProcessNotFound(Pid),

    #[error("Invalid blocking pattern: {0}")]
    InvalidBlockPattern(#[from] regex::Error),

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_error_display() {
        let err = MonitorError::ProcessNotFound(Pid(1234));
        assert_eq!(err.to_string(), "Process PID:1234 not found");
    }

    #[test]
    fn test_fatal_sampler_errors() {
        assert!(SamplerError::ToolNotFound { program: "py-spy".into() }.is_fatal());
        assert!(SamplerError::PermissionDenied { program: "py-spy".into() }.is_fatal());
        assert!(!SamplerError::Timeout(Duration::from_secs(30)).is_fatal());
        assert!(!SamplerError::NonZeroExit { status: "exit status: 1".into(), stderr: String::new() }
            .is_fatal());
    }

    #[test]
    fn test_timeout_display() {
        let err = SamplerError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Sampler timed out after 1.5s");
    }

    #[test]
    fn test_sampler_error_converts_to_monitor_error() {
        let err: MonitorError = SamplerError::ToolNotFound { program: "py-spy".into() }.into();
        assert!(err.to_string().contains("py-spy"));
    }
}
