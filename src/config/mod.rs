//! Configuration module for vidmind.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, SummaryPrompts};
pub use settings::{
    optional_api_key, require_api_key, AnswerBackend, EmbeddingSettings, GeneralSettings,
    GenerationSettings, MediaSettings, PromptSettings, RagSettings, Settings,
    TranscriptionSettings, VectorStoreSettings, ASSEMBLYAI_API_KEY_ENV, EMBEDDING_API_KEY_ENV,
    GROQ_API_KEY_ENV, OPENAI_API_KEY_ENV,
};
