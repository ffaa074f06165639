//! Pipeline orchestrator for vidmind.
//!
//! Ingestion runs download, audio extraction, transcription, frame sampling, embedding,
//! fusion and persistence in sequence. Question answering and summaries reuse the stored
//! records.

use crate::config::{AnswerBackend, Prompts, Settings};
use crate::embedding::{ClipEmbedder, Embedder};
use crate::error::{Result, VidmindError};
use crate::fusion::fuse_embeddings;
use crate::media::{validate_url, FfmpegFrameSampler, FrameSampler, MediaSource, YtDlpSource};
use crate::rag::{
    Answerer, CompletionGenerator, Generation, Generator, RetrievedContext, Retriever, Session,
    Summarizer, SummaryKind,
};
use crate::report::export_report;
use crate::storage::{save_embedding_record, video_id, DataLayout, VideoRecord, UNKNOWN_TITLE};
use crate::transcription::{AssemblyAiTranscriber, Transcriber, TranscriptionOutcome};
use crate::vector_store::{open_store, VectorStore, VectorStoreEntry};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Result of ingesting one URL.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The video was transcribed, embedded and stored.
    Ingested(VideoRecord),
    /// The provider could not transcribe the audio. Nothing was stored.
    TranscriptionFailed { video_id: String, reason: String },
}

/// A generated summary and the report written for it.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub kind: SummaryKind,
    pub generation: Generation,
    pub pdf_path: PathBuf,
}

/// An answer plus the context it was generated from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub generation: Generation,
    pub context: RetrievedContext,
}

/// Receives a short status line as each ingestion stage starts.
pub trait IngestProgress: Send + Sync {
    fn stage(&self, message: &str);
}

/// Progress sink that drops every update.
pub struct NoProgress;

impl IngestProgress for NoProgress {
    fn stage(&self, _message: &str) {}
}

fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(VidmindError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run `stage` unless `cancel` fires first. The stage future is dropped on cancel.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    stage: impl Future<Output = Result<T>>,
) -> Result<T> {
    ensure_active(cancel)?;
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(VidmindError::Cancelled),
        result = stage => result,
    }
}

/// The main orchestrator for the vidmind pipeline.
///
/// Components that need an API key (transcriber, summarizer, answerer) are built on
/// first use unless injected, so commands only require the keys they actually use.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    layout: DataLayout,
    media: Arc<dyn MediaSource>,
    sampler: Arc<dyn FrameSampler>,
    transcriber: Option<Arc<dyn Transcriber>>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    summarizer: Option<Arc<dyn Summarizer>>,
    answerer: Option<Arc<dyn Answerer>>,
    progress: Arc<dyn IngestProgress>,
}

impl Orchestrator {
    /// Create an orchestrator with the default backends.
    pub async fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let layout = DataLayout::new(settings.data_dir());
        let media = Arc::new(YtDlpSource::new(
            layout.downloads_dir(),
            &settings.media.format,
        ));
        let embedder = Arc::new(ClipEmbedder::new(&settings.embedding)?);
        let vector_store = open_store(&settings).await?;

        Ok(Self {
            settings,
            prompts,
            layout,
            media,
            sampler: Arc::new(FfmpegFrameSampler::new()),
            transcriber: None,
            embedder,
            vector_store,
            summarizer: None,
            answerer: None,
            progress: Arc::new(NoProgress),
        })
    }

    /// Create an orchestrator with custom components.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        layout: DataLayout,
        media: Arc<dyn MediaSource>,
        sampler: Arc<dyn FrameSampler>,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            layout,
            media,
            sampler,
            transcriber: Some(transcriber),
            embedder,
            vector_store,
            summarizer: None,
            answerer: None,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_answerer(mut self, answerer: Arc<dyn Answerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn IngestProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    fn transcriber(&self) -> Result<Arc<dyn Transcriber>> {
        match &self.transcriber {
            Some(t) => Ok(t.clone()),
            None => Ok(Arc::new(AssemblyAiTranscriber::new(
                &self.settings.transcription,
            )?)),
        }
    }

    fn summarizer(&self) -> Result<Arc<dyn Summarizer>> {
        match &self.summarizer {
            Some(s) => Ok(s.clone()),
            None => Ok(Arc::new(Generator::new(
                &self.settings.generation,
                self.prompts.clone(),
            )?)),
        }
    }

    fn answerer(&self) -> Result<Arc<dyn Answerer>> {
        if let Some(a) = &self.answerer {
            return Ok(a.clone());
        }
        let answerer: Arc<dyn Answerer> = match self.settings.rag.backend {
            AnswerBackend::Chat => Arc::new(Generator::new(
                &self.settings.generation,
                self.prompts.clone(),
            )?),
            AnswerBackend::Completion => Arc::new(CompletionGenerator::new(
                &self.settings.rag,
                self.settings.generation.temperature,
                self.prompts.clone(),
            )?),
        };
        Ok(answerer)
    }

    /// Ingest a video URL end to end.
    ///
    /// Download and extraction failures are returned as errors. A provider-side
    /// transcription failure is returned as [`IngestOutcome::TranscriptionFailed`].
    /// Cancelling `cancel` stops the run at the next stage boundary with
    /// [`VidmindError::Cancelled`], before anything is persisted.
    #[instrument(skip(self, cancel), fields(url = %url.trim()))]
    pub async fn ingest(&self, url: &str, cancel: &CancellationToken) -> Result<IngestOutcome> {
        let transcriber = self.transcriber()?;
        let url = url.trim();
        validate_url(url)?;

        let id = video_id(url);
        let video_dir = self.layout.video_dir(&id);
        std::fs::create_dir_all(&video_dir)?;

        self.stage("Downloading video...");
        let video = until_cancelled(cancel, self.media.download_video(url, &id)).await?;
        self.stage("Extracting audio...");
        let audio_target = self.layout.audio_path(&id);
        let audio_path =
            until_cancelled(cancel, self.media.extract_audio(&video.path, &audio_target)).await?;

        self.stage("Transcribing...");
        let transcript = match transcriber.transcribe(&audio_path, cancel).await? {
            TranscriptionOutcome::Completed(text) => text,
            TranscriptionOutcome::Failed(reason) => {
                warn!("Transcription failed: {}", reason);
                return Ok(IngestOutcome::TranscriptionFailed {
                    video_id: id,
                    reason,
                });
            }
        };
        info!("Transcript has {} chars", transcript.chars().count());

        self.stage("Sampling frames...");
        let frames = until_cancelled(
            cancel,
            self.sampler.sample(
                &video.path,
                &self.layout.frames_dir(&id),
                self.settings.media.frame_interval_seconds,
            ),
        )
        .await?;

        let mut frame_embeddings = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            self.stage(&format!("Embedding frame {}/{}...", i + 1, frames.len()));
            let embedding = until_cancelled(cancel, self.embedder.embed_image(frame)).await?;
            frame_embeddings.push(embedding);
        }
        self.stage("Embedding transcript...");
        let text_embedding = until_cancelled(cancel, self.embedder.embed_text(&transcript)).await?;

        let embedding = fuse_embeddings(&text_embedding, &frame_embeddings)?;
        let expected = self.embedder.dimensions();
        if embedding.len() != expected {
            return Err(VidmindError::Embedding(format!(
                "Fused embedding has {} dimensions, embedder reports {}",
                embedding.len(),
                expected
            )));
        }
        info!("Fused {} frame embeddings with the transcript", frames.len());

        let record = VideoRecord {
            id: id.clone(),
            url: url.to_string(),
            transcript,
            embedding,
            title: video.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            dir: video_dir,
        };

        // Last point at which a cancel leaves nothing behind
        ensure_active(cancel)?;
        self.stage("Storing record...");
        save_embedding_record(&self.layout, &record)?;
        self.vector_store
            .add(&VectorStoreEntry {
                id: record.id.clone(),
                embedding: record.embedding.clone(),
                document: record.transcript.clone(),
                metadata: record.metadata(),
            })
            .await?;
        info!("Stored video {}", record.id);

        Ok(IngestOutcome::Ingested(record))
    }

    fn stage(&self, message: &str) {
        info!("{}", message.trim_end_matches("..."));
        self.progress.stage(message);
    }

    /// Generate a summary for a stored record and export it as PDF.
    #[instrument(skip(self, record), fields(video_id = %record.id, kind = %kind))]
    pub async fn summarize(
        &self,
        record: &VideoRecord,
        kind: SummaryKind,
    ) -> Result<SummaryReport> {
        let summarizer = self.summarizer()?;

        let generation = summarizer.summarize(&record.transcript, kind).await;
        let pdf_path = export_report(
            &self.layout,
            &record.id,
            kind,
            generation.text(),
            &record.url,
        )?;

        Ok(SummaryReport {
            kind,
            generation,
            pdf_path,
        })
    }

    /// Answer a question, scoped to the session's video when it has one.
    ///
    /// The question and the answer (or its fallback) are appended to the session.
    #[instrument(skip(self, session, question))]
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<Answer> {
        let answerer = self.answerer()?;

        let top_k = if session.video_id.is_some() {
            self.settings.rag.scoped_top_k
        } else {
            self.settings.rag.top_k
        };

        let retriever = Retriever::new(self.vector_store.clone(), self.embedder.clone());
        let context = retriever
            .retrieve(question, session.video_id.as_deref(), top_k)
            .await?;

        let generation = answerer
            .answer(&context.context, &session.history, question)
            .await;

        session.push_user(question);
        session.push_assistant(generation.text());

        Ok(Answer {
            generation,
            context,
        })
    }
}
