//! Configuration settings for vidmind.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the transcription provider key.
pub const ASSEMBLYAI_API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";
/// Environment variable holding the chat-completion provider key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
/// Environment variable holding the legacy completion provider key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the (optional) embedding service key.
pub const EMBEDDING_API_KEY_ENV: &str = "EMBEDDING_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub media: MediaSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub rag: RagSettings,
    pub vector_store: VectorStoreSettings,
    pub prompts: PromptSettings,
}

/// Accepted range for `transcription.poll_backoff_factor`.
pub const MIN_BACKOFF_FACTOR: f64 = 1.0;
pub const MAX_BACKOFF_FACTOR: f64 = 10.0;

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Root directory for videos, reports and downloads.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Video download and frame sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// yt-dlp format selector. Pre-merged formats only, so no ffmpeg merge is needed.
    pub format: String,
    /// Seconds between sampled frames.
    pub frame_interval_seconds: f64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            format: "best[ext=mp4]/best".to_string(),
            frame_interval_seconds: 5.0,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Base URL of the AssemblyAI-compatible API.
    pub base_url: String,
    /// Language hint sent with each job.
    pub language_code: String,
    /// Ask the provider for auto chapters.
    pub auto_chapters: bool,
    /// Initial delay between status polls.
    pub poll_interval_seconds: u64,
    /// Multiplier applied to the delay after every poll (1.0 keeps it fixed).
    pub poll_backoff_factor: f64,
    /// Upper bound for the delay between polls.
    pub max_poll_interval_seconds: u64,
    /// Give up waiting after this many seconds. `0` means wait indefinitely.
    pub timeout_seconds: Option<u64>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com".to_string(),
            language_code: "en".to_string(),
            auto_chapters: false,
            poll_interval_seconds: 3,
            poll_backoff_factor: 1.0,
            max_poll_interval_seconds: 30,
            timeout_seconds: Some(1800),
        }
    }
}

impl TranscriptionSettings {
    /// Timeout as a `Duration`. `0` means wait indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Multimodal embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of the CLIP embedding service.
    pub base_url: String,
    /// Model name sent with each request.
    pub model: String,
    /// Expected embedding dimensions.
    pub dimensions: usize,
    /// Character budget for text input (a proxy for the 77-token CLIP context).
    pub max_text_chars: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:51000/v1".to_string(),
            model: "openai/clip-vit-base-patch32".to_string(),
            dimensions: 512,
            max_text_chars: 400,
        }
    }
}

/// Chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of the OpenAI-compatible chat API.
    pub base_url: String,
    /// Model used for every request.
    pub model: String,
    pub temperature: f32,
    pub answer_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub detailed_max_tokens: u32,
    pub breakdown_max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
            answer_max_tokens: 300,
            summary_max_tokens: 300,
            detailed_max_tokens: 1000,
            breakdown_max_tokens: 1000,
        }
    }
}

/// Answer backend for question answering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerBackend {
    /// Chat completions with conversation history (default).
    #[default]
    Chat,
    /// Legacy single-prompt completions.
    Completion,
}

impl std::str::FromStr for AnswerBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(AnswerBackend::Chat),
            "completion" | "completions" => Ok(AnswerBackend::Completion),
            _ => Err(format!("Unknown answer backend: {}", s)),
        }
    }
}

impl std::fmt::Display for AnswerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerBackend::Chat => write!(f, "chat"),
            AnswerBackend::Completion => write!(f, "completion"),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Candidates fetched when questions span the whole library.
    pub top_k: usize,
    /// Candidates fetched before filtering to the session's video.
    pub scoped_top_k: usize,
    pub backend: AnswerBackend,
    /// Base URL for the completion backend.
    pub completion_base_url: String,
    /// Model for the completion backend.
    pub completion_model: String,
    pub completion_max_tokens: u32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            scoped_top_k: 10,
            backend: AnswerBackend::Chat,
            completion_base_url: "https://api.openai.com/v1".to_string(),
            completion_model: "llama-3.3-70b-versatile".to_string(),
            completion_max_tokens: 256,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, chroma, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider). Defaults to `<data_dir>/vectors.db`.
    pub sqlite_path: Option<String>,
    /// Chroma server URL (for chroma provider).
    pub chroma_url: String,
    /// Collection name.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: None,
            chroma_url: "http://127.0.0.1:8000".to_string(),
            collection: "youtube_summarizer".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidmind")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        match &self.vector_store.sqlite_path {
            Some(path) => Self::expand_path(path),
            None => self.data_dir().join("vectors.db"),
        }
    }

    /// Reject values that would stall or crash the pipeline.
    pub fn validate(&self) -> crate::error::Result<()> {
        let t = &self.transcription;
        if t.poll_interval_seconds == 0 {
            return Err(crate::error::VidmindError::Config(
                "transcription.poll_interval_seconds must be at least 1".to_string(),
            ));
        }
        if !(MIN_BACKOFF_FACTOR..=MAX_BACKOFF_FACTOR).contains(&t.poll_backoff_factor) {
            return Err(crate::error::VidmindError::Config(format!(
                "transcription.poll_backoff_factor must be between {} and {}, got {}",
                MIN_BACKOFF_FACTOR, MAX_BACKOFF_FACTOR, t.poll_backoff_factor
            )));
        }
        if t.max_poll_interval_seconds < t.poll_interval_seconds {
            return Err(crate::error::VidmindError::Config(
                "transcription.max_poll_interval_seconds must not be below poll_interval_seconds"
                    .to_string(),
            ));
        }
        let interval = self.media.frame_interval_seconds;
        if interval.is_nan() || interval <= 0.0 {
            return Err(crate::error::VidmindError::Config(
                "media.frame_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a required API key from the environment.
///
/// Missing or empty keys are a configuration error, raised before any request is made.
pub fn require_api_key(var: &str) -> crate::error::Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(crate::error::VidmindError::Config(format!(
            "{} is empty. Set it in your environment or .env file",
            var
        ))),
        Err(_) => Err(crate::error::VidmindError::Config(format!(
            "{} not set. Set it in your environment or .env file",
            var
        ))),
    }
}

/// Read an optional API key from the environment.
pub fn optional_api_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|k| !k.trim().is_empty())
}
