//! In-memory sampler replaying canned results.

use std::collections::VecDeque;
use tokio::sync::oneshot;

use super::StackSampler;
use crate::domain::{Pid, SamplerError};

/// Hands out pre-recorded sampler results in order.
///
/// Once the script runs dry every further call fails with a recoverable
/// [`SamplerError::NonZeroExit`], and the receiver from
/// [`when_exhausted`](Self::when_exhausted) fires as the last entry is handed out.
#[derive(Debug, Default)]
pub struct ScriptedSampler {
    script: VecDeque<Result<String, SamplerError>>,
    calls: usize,
    exhausted: Option<oneshot::Sender<()>>,
}

impl ScriptedSampler {
    /// Script of successful dumps
    pub fn new<I, S>(dumps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(dumps.into_iter().map(|d| Ok(d.into())))
    }

    /// Script mixing dumps and failures
    pub fn from_results(results: impl IntoIterator<Item = Result<String, SamplerError>>) -> Self {
        Self { script: results.into_iter().collect(), calls: 0, exhausted: None }
    }

    /// Fires when the final scripted result has been handed out.
    pub fn when_exhausted(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.exhausted = Some(tx);
        rx
    }

    /// Number of `sample` calls so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl StackSampler for ScriptedSampler {
    async fn sample(&mut self, _pid: Pid) -> Result<String, SamplerError> {
        self.calls += 1;
        let next = self.script.pop_front();
        if self.script.is_empty() {
            if let Some(tx) = self.exhausted.take() {
                let _ = tx.send(());
            }
        }
        next.unwrap_or_else(|| {
            Err(SamplerError::NonZeroExit {
                status: "script exhausted".to_string(),
                stderr: String::new(),
            })
        })
    }
}
