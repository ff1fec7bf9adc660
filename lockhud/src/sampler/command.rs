//! Sampler backed by an external command.

use log::debug;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::StackSampler;
use crate::domain::{Pid, SamplerError};

/// Sampler program used when none is configured
pub const DEFAULT_SAMPLER: &str = "py-spy";

/// Upper bound on one sampler invocation
pub const DEFAULT_SAMPLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `<program> dump --pid <PID>` and returns its stdout.
///
/// The child is killed if it outlives the timeout.
#[derive(Debug, Clone)]
pub struct CommandSampler {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSampler {
    /// Sampler invoking `program dump --pid <PID>`.
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: vec!["dump".to_string(), "--pid".to_string()],
            timeout,
        }
    }

    /// Replace the arguments placed before the pid.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn spawn_error(&self, err: std::io::Error) -> SamplerError {
        match err.kind() {
            ErrorKind::NotFound => SamplerError::ToolNotFound { program: self.program.clone() },
            ErrorKind::PermissionDenied => {
                SamplerError::PermissionDenied { program: self.program.clone() }
            }
            _ => SamplerError::Io(err),
        }
    }
}

impl StackSampler for CommandSampler {
    async fn sample(&mut self, pid: Pid) -> Result<String, SamplerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(pid.0.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Running {} {} {}", self.program, self.args.join(" "), pid.0);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.spawn_error(e)),
            Err(_) => return Err(SamplerError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(SamplerError::NonZeroExit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_is_fatal() {
        let mut sampler =
            CommandSampler::new("/nonexistent/lockhud-sampler", Duration::from_secs(5));
        let err = sampler.sample(Pid(1)).await.unwrap_err();
        assert!(matches!(err, SamplerError::ToolNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_stdout_is_returned() {
        // `echo dump --pid 42` prints its arguments
        let mut sampler = CommandSampler::new("echo", Duration::from_secs(5));
        let out = sampler.sample(Pid(42)).await.unwrap();
        assert_eq!(out.trim(), "dump --pid 42");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_recoverable() {
        let mut sampler = CommandSampler::new("false", Duration::from_secs(5)).with_args(vec![]);
        let err = sampler.sample(Pid(42)).await.unwrap_err();
        assert!(matches!(err, SamplerError::NonZeroExit { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut sampler =
            CommandSampler::new("sleep", Duration::from_millis(100)).with_args(vec![]);
        // `sleep 30`: the pid argument doubles as the sleep duration
        let err = sampler.sample(Pid(30)).await.unwrap_err();
        assert!(matches!(err, SamplerError::Timeout(_)));
        assert!(!err.is_fatal());
    }
}
