//! CLI module for vidmind.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::AnswerBackend;
use clap::{Parser, Subcommand};

/// vidmind - Multimodal video ingestion and Q&A
///
/// Transcribes videos, fuses transcript and frame embeddings into one vector per video,
/// and answers questions over everything ingested.
#[derive(Parser, Debug)]
#[command(name = "vidmind")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Download, transcribe, embed and store a video
    Ingest {
        /// Video URL
        url: String,

        /// Summary to generate afterwards (brief, detailed, breakdown)
        #[arg(short, long, default_value = "brief")]
        summary: String,

        /// Skip summary generation
        #[arg(long)]
        no_summary: bool,
    },

    /// Ask a question about ingested videos
    Ask {
        /// The question to ask
        question: String,

        /// Restrict context to one video ID
        #[arg(long)]
        video: Option<String>,

        /// Number of nearest videos to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Answer backend (chat, completion); overrides rag.backend
        #[arg(long)]
        backend: Option<AnswerBackend>,
    },

    /// Start an interactive chat session
    Chat {
        /// Restrict context to one video ID
        #[arg(long)]
        video: Option<String>,

        /// Answer backend (chat, completion); overrides rag.backend
        #[arg(long)]
        backend: Option<AnswerBackend>,
    },

    /// Regenerate a summary report for a stored video
    Summarize {
        /// Video ID
        video_id: String,

        /// Summary kind (brief, detailed, breakdown)
        #[arg(short, long, default_value = "brief")]
        kind: String,
    },

    /// List ingested videos
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
