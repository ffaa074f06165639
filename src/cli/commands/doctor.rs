//! Doctor command: report whether the tools, keys and storage a run needs are in place.

use crate::cli::Output;
use crate::config::{
    AnswerBackend, Settings, ASSEMBLYAI_API_KEY_ENV, EMBEDDING_API_KEY_ENV, GROQ_API_KEY_ENV,
    OPENAI_API_KEY_ENV,
};
use console::style;
use std::process::Command;

/// External binaries the pipeline shells out to, with the flag that prints their version.
const TOOLS: [(&str, &str); 3] = [
    ("yt-dlp", "--version"),
    ("ffmpeg", "-version"),
    ("ffprobe", "-version"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Pass,
    Warn,
    Fail,
}

/// One diagnostic line.
#[derive(Debug)]
struct Finding {
    label: String,
    severity: Severity,
    detail: String,
    hint: Option<String>,
}

impl Finding {
    fn new(label: impl Into<String>, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            severity,
            detail: detail.into(),
            hint: None,
        }
    }

    fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn print(&self) {
        let marker = match self.severity {
            Severity::Pass => style("ok").green(),
            Severity::Warn => style("!!").yellow(),
            Severity::Fail => style("xx").red(),
        };
        println!("  [{}] {}: {}", marker, style(&self.label).bold(), self.detail);
        if let Some(hint) = &self.hint {
            println!("       {}", style(hint).dim());
        }
    }
}

/// Run all diagnostics. Fails when any required piece is missing.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("vidmind doctor");

    let sections = [
        (
            "Media tools",
            TOOLS
                .iter()
                .map(|(name, flag)| check_tool(name, flag))
                .collect::<Vec<_>>(),
        ),
        ("Provider keys", key_findings(settings)),
        ("Storage", storage_findings(settings)),
        ("Configuration", vec![config_finding()]),
    ];

    let mut failures = 0;
    let mut warnings = 0;
    for (title, findings) in &sections {
        println!("\n{}", style(title).bold());
        for finding in findings {
            finding.print();
            match finding.severity {
                Severity::Fail => failures += 1,
                Severity::Warn => warnings += 1,
                Severity::Pass => {}
            }
        }
    }
    Output::kv("Embedding service", &settings.embedding.base_url);
    Output::kv("Answer backend", &settings.rag.backend.to_string());
    println!();

    if failures > 0 {
        anyhow::bail!("{} required check(s) failed", failures);
    }
    if warnings > 0 {
        Output::warning(&format!("Ready, with {} warning(s).", warnings));
    } else {
        Output::success("Ready to ingest.");
    }
    Ok(())
}

fn check_tool(name: &str, version_flag: &str) -> Finding {
    match Command::new(name).arg(version_flag).output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let first = stdout.lines().next().unwrap_or("installed").trim();
            Finding::new(name, Severity::Pass, first.chars().take(60).collect::<String>())
        }
        Ok(output) => Finding::new(name, Severity::Fail, format!("exited with {}", output.status))
            .hint(install_hint(name)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Finding::new(name, Severity::Fail, "not on PATH").hint(install_hint(name))
        }
        Err(e) => Finding::new(name, Severity::Fail, e.to_string()).hint(install_hint(name)),
    }
}

fn install_hint(tool: &str) -> &'static str {
    match tool {
        "yt-dlp" => "pip install yt-dlp, or see https://github.com/yt-dlp/yt-dlp",
        _ if cfg!(target_os = "macos") => "brew install ffmpeg",
        _ => "Install ffmpeg (it ships ffprobe) from your package manager",
    }
}

fn key_findings(settings: &Settings) -> Vec<Finding> {
    let completion = settings.rag.backend == AnswerBackend::Completion;
    [
        (ASSEMBLYAI_API_KEY_ENV, true, "transcription"),
        (GROQ_API_KEY_ENV, true, "summaries and chat answers"),
        (OPENAI_API_KEY_ENV, completion, "the completion answer backend"),
        (EMBEDDING_API_KEY_ENV, false, "embedding services that require auth"),
    ]
    .into_iter()
    .map(|(var, required, used_for)| key_finding(var, required, used_for))
    .collect()
}

/// Missing required keys fail, missing optional keys warn.
fn key_finding(var: &str, required: bool, used_for: &str) -> Finding {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => {
            Finding::new(var, Severity::Pass, mask_key(key.trim()))
        }
        _ => {
            let severity = if required { Severity::Fail } else { Severity::Warn };
            Finding::new(var, severity, "not set").hint(format!("Used for {}", used_for))
        }
    }
}

/// Show only the edges of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn storage_findings(settings: &Settings) -> Vec<Finding> {
    let data_dir = settings.data_dir();
    let mut findings = vec![if data_dir.is_dir() {
        Finding::new("Data directory", Severity::Pass, data_dir.display().to_string())
    } else {
        Finding::new("Data directory", Severity::Warn, data_dir.display().to_string())
            .hint("Created on first ingest")
    }];

    let store = &settings.vector_store;
    findings.push(match store.provider.as_str() {
        "sqlite" => {
            let path = settings.sqlite_path();
            match std::fs::metadata(&path) {
                Ok(meta) => Finding::new(
                    "Vector store",
                    Severity::Pass,
                    format!("sqlite {} ({} KB)", path.display(), meta.len() / 1024),
                ),
                Err(_) => Finding::new(
                    "Vector store",
                    Severity::Warn,
                    format!("sqlite {} not created yet", path.display()),
                ),
            }
        }
        "chroma" => match url::Url::parse(&store.chroma_url) {
            Ok(_) => Finding::new(
                "Vector store",
                Severity::Pass,
                format!("chroma {} / {}", store.chroma_url, store.collection),
            ),
            Err(e) => {
                Finding::new("Vector store", Severity::Fail, format!("bad chroma_url: {}", e))
            }
        },
        "memory" => Finding::new("Vector store", Severity::Warn, "memory (not persisted)"),
        other => Finding::new(
            "Vector store",
            Severity::Fail,
            format!("unknown provider '{}'", other),
        )
        .hint("Use sqlite, chroma or memory"),
    });

    findings
}

fn config_finding() -> Finding {
    let path = Settings::default_config_path();
    if path.exists() {
        Finding::new("Config file", Severity::Pass, path.display().to_string())
    } else {
        Finding::new("Config file", Severity::Warn, "not found, using defaults")
            .hint("See 'vidmind config show'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key("gsk_abcdefghijkl"), "gsk_...ijkl");
    }

    #[test]
    #[serial]
    fn test_optional_key_only_warns() {
        std::env::remove_var(EMBEDDING_API_KEY_ENV);
        assert_eq!(key_finding(EMBEDDING_API_KEY_ENV, false, "x").severity, Severity::Warn);
        assert_eq!(key_finding(EMBEDDING_API_KEY_ENV, true, "x").severity, Severity::Fail);
    }

    #[test]
    fn test_unknown_store_provider_fails() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "faiss".to_string();
        let findings = storage_findings(&settings);
        assert_eq!(findings[1].severity, Severity::Fail);

        settings.vector_store.provider = "memory".to_string();
        assert_eq!(storage_findings(&settings)[1].severity, Severity::Warn);
    }

    #[test]
    fn test_missing_tool_fails() {
        let finding = check_tool("definitely-not-a-real-tool-vidmind", "--version");
        assert_eq!(finding.severity, Severity::Fail);
        assert!(finding.hint.is_some());
    }
}
