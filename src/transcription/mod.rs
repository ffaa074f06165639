//! Transcription module for vidmind.
//!
//! Audio is uploaded to a hosted speech-to-text provider, a job is started, and its
//! status is polled until the provider reports completion or failure.

mod assemblyai;

pub use assemblyai::{AssemblyAiTranscriber, JobStatus};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Final state of a transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionOutcome {
    /// The provider finished and returned the transcript text.
    Completed(String),
    /// The provider rejected the audio or the job errored.
    Failed(String),
}

/// How long and how often to wait on a transcription job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the first re-poll.
    pub interval: Duration,
    /// Multiplier applied to the delay after each poll.
    pub backoff_factor: f64,
    /// Ceiling for the delay.
    pub max_interval: Duration,
    /// Total time to wait before giving up. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
            timeout: Some(Duration::from_secs(1800)),
        }
    }
}

impl PollPolicy {
    pub fn from_settings(settings: &crate::config::TranscriptionSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.poll_interval_seconds),
            backoff_factor: settings.poll_backoff_factor,
            max_interval: Duration::from_secs(settings.max_poll_interval_seconds),
            timeout: settings.timeout(),
        }
    }

    /// Delay that follows `current`. Factors that are not finite or not above 1 keep the
    /// delay fixed.
    pub fn next_interval(&self, current: Duration) -> Duration {
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            return current;
        }
        let ceiling = self.max_interval.max(current);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .map_or(ceiling, |next| next.min(ceiling))
    }
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file, waiting for the job to finish.
    ///
    /// Provider-side failures are reported as [`TranscriptionOutcome::Failed`]. Timeouts and
    /// cancellation are errors.
    async fn transcribe(
        &self,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<TranscriptionOutcome>;
}
