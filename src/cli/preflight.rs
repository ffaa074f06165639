//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and API keys are available
//! before starting operations that would otherwise fail midway.

use crate::config::{
    require_api_key, AnswerBackend, ASSEMBLYAI_API_KEY_ENV, GROQ_API_KEY_ENV, OPENAI_API_KEY_ENV,
};
use crate::error::{Result, VidmindError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion needs the media tools and the transcription key, plus the generation
    /// key when a summary is requested.
    Ingest { with_summary: bool },
    /// Summaries need the generation key.
    Summarize,
    /// Questions need the key of the configured answer backend.
    Ask(AnswerBackend),
    /// Listing stored records has no external requirements.
    List,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ingest { with_summary } => {
            require_api_key(ASSEMBLYAI_API_KEY_ENV)?;
            if with_summary {
                require_api_key(GROQ_API_KEY_ENV)?;
            }
            check_tool("yt-dlp")?;
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::Summarize => {
            require_api_key(GROQ_API_KEY_ENV)?;
        }
        Operation::Ask(AnswerBackend::Chat) => {
            require_api_key(GROQ_API_KEY_ENV)?;
        }
        Operation::Ask(AnswerBackend::Completion) => {
            require_api_key(OPENAI_API_KEY_ENV)?;
        }
        Operation::List => {}
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidmindError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidmindError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidmindError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_check_list_no_requirements() {
        assert!(check(Operation::List).is_ok());
    }

    #[test]
    #[serial]
    fn test_ask_requires_backend_key() {
        std::env::set_var(GROQ_API_KEY_ENV, "gsk_test");
        std::env::remove_var(OPENAI_API_KEY_ENV);

        assert!(check(Operation::Ask(AnswerBackend::Chat)).is_ok());
        assert!(matches!(
            check(Operation::Ask(AnswerBackend::Completion)),
            Err(VidmindError::Config(_))
        ));

        std::env::remove_var(GROQ_API_KEY_ENV);
    }

    #[test]
    #[serial]
    fn test_ingest_checks_key_before_tools() {
        std::env::remove_var(ASSEMBLYAI_API_KEY_ENV);
        assert!(matches!(
            check(Operation::Ingest { with_summary: false }),
            Err(VidmindError::Config(_))
        ));
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("definitely-not-a-real-tool-vidmind"),
            Err(VidmindError::ToolNotFound(_))
        ));
    }
}
