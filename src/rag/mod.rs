//! Retrieval-augmented question answering and transcript summaries.

pub mod context;
mod response;
mod session;

pub use context::{RetrievedContext, Retriever, NO_CONTEXT};
pub use response::{Answerer, CompletionGenerator, Generation, Generator, Summarizer};
pub use session::{ChatMessage, Role, Session};

use crate::config::{GenerationSettings, SummaryPrompts};
use crate::error::VidmindError;
use std::fmt;
use std::str::FromStr;

/// Fallback returned when an answer cannot be generated.
pub const ANSWER_FALLBACK: &str = "Failed to generate answer.";

/// The three summary variants a transcript can be turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryKind {
    Brief,
    Detailed,
    Breakdown,
}

impl SummaryKind {
    pub const ALL: [SummaryKind; 3] = [Self::Brief, Self::Detailed, Self::Breakdown];

    /// Literal text used when generation fails.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            Self::Brief => "Failed to generate summary.",
            Self::Detailed => "Failed to generate detailed explanation.",
            Self::Breakdown => "Failed to generate time-aligned breakdown.",
        }
    }

    pub fn template<'a>(&self, prompts: &'a SummaryPrompts) -> &'a str {
        match self {
            Self::Brief => &prompts.brief,
            Self::Detailed => &prompts.detailed,
            Self::Breakdown => &prompts.breakdown,
        }
    }

    pub fn max_tokens(&self, settings: &GenerationSettings) -> u32 {
        match self {
            Self::Brief => settings.summary_max_tokens,
            Self::Detailed => settings.detailed_max_tokens,
            Self::Breakdown => settings.breakdown_max_tokens,
        }
    }

    /// Apply variant-specific cleanup to raw model output.
    ///
    /// Breakdowns are flattened to one trimmed entry per paragraph.
    pub fn post_process(&self, text: &str) -> String {
        match self {
            Self::Breakdown => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
            _ => text.to_string(),
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Brief => "brief",
            Self::Detailed => "detailed",
            Self::Breakdown => "breakdown",
        };
        f.write_str(name)
    }
}

impl FromStr for SummaryKind {
    type Err = VidmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brief" | "summary" => Ok(Self::Brief),
            "detailed" => Ok(Self::Detailed),
            "breakdown" | "time-aligned" => Ok(Self::Breakdown),
            other => Err(VidmindError::InvalidInput(format!(
                "Unknown summary kind '{}' (expected brief, detailed or breakdown)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_post_processing() {
        let raw = "  [00:00] Intro: hi  \n\n\n[01:15] Topic: stuff\n   \n";
        assert_eq!(
            SummaryKind::Breakdown.post_process(raw),
            "[00:00] Intro: hi\n\n[01:15] Topic: stuff"
        );
    }

    #[test]
    fn test_brief_left_untouched() {
        let raw = "line one\nline two";
        assert_eq!(SummaryKind::Brief.post_process(raw), raw);
    }

    #[test]
    fn test_parse_and_display() {
        for kind in SummaryKind::ALL {
            assert_eq!(kind.to_string().parse::<SummaryKind>().unwrap(), kind);
        }
        assert!("haiku".parse::<SummaryKind>().is_err());
    }

    #[test]
    fn test_token_caps() {
        let settings = GenerationSettings::default();
        assert_eq!(SummaryKind::Brief.max_tokens(&settings), 300);
        assert_eq!(SummaryKind::Detailed.max_tokens(&settings), 1000);
        assert_eq!(SummaryKind::Breakdown.max_tokens(&settings), 1000);
    }
}
