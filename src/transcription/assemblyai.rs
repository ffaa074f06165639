//! AssemblyAI transcription client.

use super::{PollPolicy, Transcriber, TranscriptionOutcome};
use crate::config::{require_api_key, TranscriptionSettings, ASSEMBLYAI_API_KEY_ENV};
use crate::error::{Result, VidmindError};
use crate::openai::http_client;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    language_code: &'a str,
    auto_chapters: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptCreated {
    id: String,
}

/// Status payload returned while polling a job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    /// Terminal outcome for this status, or `None` while the job is still running.
    pub fn outcome(&self) -> Option<TranscriptionOutcome> {
        match self.status.as_str() {
            "completed" => Some(TranscriptionOutcome::Completed(
                self.text.clone().unwrap_or_default(),
            )),
            "error" => Some(TranscriptionOutcome::Failed(
                self.error.clone().unwrap_or_else(|| "unknown provider error".to_string()),
            )),
            _ => None,
        }
    }
}

/// Uploads audio to AssemblyAI and waits for the transcript.
pub struct AssemblyAiTranscriber {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    language_code: String,
    auto_chapters: bool,
    policy: PollPolicy,
}

impl AssemblyAiTranscriber {
    /// Create a transcriber from settings, reading the key from `ASSEMBLYAI_API_KEY`.
    pub fn new(settings: &TranscriptionSettings) -> Result<Self> {
        let api_key = require_api_key(ASSEMBLYAI_API_KEY_ENV)?;
        Self::with_api_key(settings, &api_key)
    }

    /// Create a transcriber with an explicit key.
    pub fn with_api_key(settings: &TranscriptionSettings, api_key: &str) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language_code: settings.language_code.clone(),
            auto_chapters: settings.auto_chapters,
            policy: PollPolicy::from_settings(settings),
        })
    }

    /// Override the polling policy.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Upload the audio file. Returns the provider URL, or the failure message.
    async fn upload(&self, audio_path: &Path) -> Result<std::result::Result<String, String>> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(Err(format!("Upload failed ({}): {}", status, body)));
        }

        let upload: UploadResponse = response.json().await?;
        Ok(Ok(upload.upload_url))
    }

    /// Start a transcription job. Returns the job ID, or the failure message.
    async fn submit(&self, audio_url: &str) -> Result<std::result::Result<String, String>> {
        let request = TranscriptRequest {
            audio_url,
            language_code: &self.language_code,
            auto_chapters: self.auto_chapters,
        };

        let response = self
            .http
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(Err(format!("Transcription request failed ({}): {}", status, body)));
        }

        let created: TranscriptCreated = response.json().await?;
        Ok(Ok(created.id))
    }

    async fn fetch_status(&self, job_id: &str) -> Result<std::result::Result<JobStatus, String>> {
        let response = self
            .http
            .get(format!("{}/v2/transcript/{}", self.base_url, job_id))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(Err(format!("Status request failed ({}): {}", status, body)));
        }

        Ok(Ok(response.json().await?))
    }

    /// Poll a job until it finishes, the deadline passes, or the caller cancels.
    #[instrument(skip(self, cancel))]
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TranscriptionOutcome> {
        let started = Instant::now();
        let mut delay = self.policy.interval;

        loop {
            if cancel.is_cancelled() {
                return Err(VidmindError::Cancelled);
            }

            let status = match self.fetch_status(job_id).await? {
                Ok(status) => status,
                Err(message) => return Ok(TranscriptionOutcome::Failed(message)),
            };

            if let Some(outcome) = status.outcome() {
                match &outcome {
                    TranscriptionOutcome::Completed(_) => info!("Transcription complete"),
                    TranscriptionOutcome::Failed(e) => warn!("Transcription failed: {}", e),
                }
                return Ok(outcome);
            }
            debug!("Job {} is {}", job_id, status.status);

            let wait = match self.policy.timeout {
                Some(timeout) => {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        return Err(VidmindError::TranscriptionTimeout {
                            job_id: job_id.to_string(),
                            waited_secs: elapsed.as_secs(),
                        });
                    }
                    delay.min(timeout - elapsed)
                }
                None => delay,
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(VidmindError::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }

            delay = self.policy.next_interval(delay);
        }
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    #[instrument(skip(self, cancel), fields(audio_path = %audio_path.display()))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<TranscriptionOutcome> {
        let audio_url = match self.upload(audio_path).await? {
            Ok(url) => url,
            Err(message) => {
                warn!("{}", message);
                return Ok(TranscriptionOutcome::Failed(message));
            }
        };
        info!("Audio uploaded");

        let job_id = match self.submit(&audio_url).await? {
            Ok(id) => id,
            Err(message) => {
                warn!("{}", message);
                return Ok(TranscriptionOutcome::Failed(message));
            }
        };
        info!("Transcription started, ID: {}", job_id);

        self.wait_for_job(&job_id, cancel).await
    }
}
