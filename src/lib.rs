//! vidmind - Multimodal video ingestion and Q&A
//!
//! Turns a video URL into a single searchable vector by fusing the transcript embedding
//! with embeddings of sampled frames, then answers questions over everything ingested.
//!
//! # Overview
//!
//! vidmind allows you to:
//! - Download a video and transcribe its audio with a hosted speech-to-text service
//! - Sample frames and embed them alongside the transcript in a shared CLIP space
//! - Store one fused vector per video in SQLite or Chroma
//! - Ask questions with retrieval-augmented generation
//! - Export brief, detailed or time-aligned summaries as PDF
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `media` - Video download, audio extraction and frame sampling
//! - `transcription` - Speech-to-text job submission and polling
//! - `embedding` - Image and text embeddings
//! - `fusion` - Averaging of text and frame vectors
//! - `storage` - On-disk layout and JSON records
//! - `vector_store` - Vector database abstraction
//! - `rag` - Retrieval, answers and summaries
//! - `report` - PDF export
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use vidmind::config::Settings;
//! use vidmind::orchestrator::{IngestOutcome, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!
//!     let outcome = orchestrator
//!         .ingest("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &CancellationToken::new())
//!         .await?;
//!     if let IngestOutcome::Ingested(record) = outcome {
//!         println!("Stored {} ({} dims)", record.id, record.embedding.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod fusion;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod report;
pub mod storage;
pub mod transcription;
pub mod vector_store;

pub use error::{Result, VidmindError};
