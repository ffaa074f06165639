//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidmindError;
use crate::orchestrator::{IngestOutcome, IngestProgress, Orchestrator};
use crate::rag::SummaryKind;
use anyhow::Result;
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Shell convention for a process ended by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Shows each ingestion stage on a spinner.
struct SpinnerProgress(ProgressBar);

impl IngestProgress for SpinnerProgress {
    fn stage(&self, message: &str) {
        self.0.set_message(message.to_string());
    }
}

/// Run the ingest command.
pub async fn run_ingest(
    url: &str,
    summary: &str,
    no_summary: bool,
    settings: Settings,
) -> Result<()> {
    let kind: Option<SummaryKind> = if no_summary {
        None
    } else {
        Some(summary.parse()?)
    };

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ingest {
        with_summary: kind.is_some(),
    }) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidmind doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::info(&format!("Processing: {}", url.trim()));
    let spinner = Output::spinner("Preparing...");
    let orchestrator = Orchestrator::new(settings)
        .await?
        .with_progress(Arc::new(SpinnerProgress(spinner.clone())));

    let cancel = CancellationToken::new();
    let watcher = watch_interrupts(cancel.clone());
    let result = ingest_and_summarize(&orchestrator, url, kind, &spinner, &cancel).await;
    watcher.abort();
    spinner.finish_and_clear();
    result
}

async fn ingest_and_summarize(
    orchestrator: &Orchestrator,
    url: &str,
    kind: Option<SummaryKind>,
    spinner: &ProgressBar,
    cancel: &CancellationToken,
) -> Result<()> {
    let record = match orchestrator.ingest(url, cancel).await {
        Ok(IngestOutcome::Ingested(record)) => record,
        Ok(IngestOutcome::TranscriptionFailed { video_id, reason }) => {
            spinner.finish_and_clear();
            Output::error(&format!("Transcription failed for {}: {}", video_id, reason));
            return Ok(());
        }
        Err(VidmindError::Cancelled) => {
            spinner.finish_and_clear();
            Output::warning("Ingestion cancelled. Nothing was stored.");
            return Err(VidmindError::Cancelled.into());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to ingest: {}", e));
            return Err(e.into());
        }
    };

    spinner.suspend(|| {
        Output::success(&format!("Stored '{}' as {}", record.title, record.id));
        Output::kv("Embedding dimensions", &record.embedding.len().to_string());
        Output::kv("Record", &record.dir.join("embedding.json").display().to_string());
    });

    let Some(kind) = kind else {
        return Ok(());
    };

    spinner.set_message(format!("Generating {} summary...", kind));
    let report = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            spinner.finish_and_clear();
            Output::warning("Summary cancelled. The video record was kept.");
            return Err(VidmindError::Cancelled.into());
        }
        report = orchestrator.summarize(&record, kind) => report?,
    };
    spinner.finish_and_clear();

    if let Some(error) = report.generation.error() {
        Output::error(&format!("{} ({})", report.generation.text(), error));
    } else {
        Output::header("Summary");
        println!("\n{}\n", report.generation.text());
    }
    Output::kv("PDF", &report.pdf_path.display().to_string());

    Ok(())
}

/// First Ctrl-C cancels the run gracefully. A second one exits immediately.
fn watch_interrupts(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        cancel.cancel();
        eprintln!("\nStopping after the current step. Press Ctrl-C again to quit now.");

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
}
