//! Error types for vidmind.

use thiserror::Error;

/// Library-level error type for vidmind operations.
#[derive(Error, Debug)]
pub enum VidmindError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video download failed: {0}")]
    Download(String),

    #[error("Transcription job {job_id} did not finish within {waited_secs}s")]
    TranscriptionTimeout { job_id: String, waited_secs: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("LLM provider error: {0}")]
    Provider(#[from] async_openai::error::OpenAIError),

    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for vidmind operations.
pub type Result<T> = std::result::Result<T, VidmindError>;
