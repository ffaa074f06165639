//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::SummaryKind;
use crate::storage::{load_embedding_record, VideoRecord};
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(video_id: &str, kind: &str, settings: Settings) -> Result<()> {
    let kind: SummaryKind = kind.parse()?;

    if let Err(e) = preflight::check(Operation::Summarize) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidmind doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings).await?;
    let stored = load_embedding_record(orchestrator.layout(), video_id)?;
    let record = VideoRecord::from_embedding_record(stored, orchestrator.layout());

    let spinner = Output::spinner(&format!("Generating {} summary...", kind));
    let report = orchestrator.summarize(&record, kind).await;
    spinner.finish_and_clear();
    let report = report?;

    if let Some(error) = report.generation.error() {
        Output::error(&format!("{} ({})", report.generation.text(), error));
    } else {
        println!("\n{}\n", report.generation.text());
    }
    Output::success(&format!("Report written to {}", report.pdf_path.display()));

    Ok(())
}
