//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::Session;
use crate::storage::check_video_id;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    video: Option<String>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask(settings.rag.backend)) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidmind doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(id) = &video {
        check_video_id(id)?;
    }

    if let Some(k) = top_k {
        settings.rag.top_k = k;
        settings.rag.scoped_top_k = k;
    }

    let orchestrator = Orchestrator::new(settings).await?;
    let mut session = Session::new(video);

    let spinner = Output::spinner("Searching knowledge base...");
    let answer = orchestrator.ask(&mut session, question).await;
    spinner.finish_and_clear();

    let answer = match answer {
        Ok(answer) => answer,
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    };

    if let Some(error) = answer.generation.error() {
        Output::error(&format!("{} ({})", answer.generation.text(), error));
    } else {
        println!("\n{}\n", answer.generation.text());
    }

    if !answer.context.is_empty() {
        Output::header("Sources");
        for m in &answer.context.matches {
            Output::context_match(&m.metadata.title, &m.id, m.distance, &m.document);
        }
    }

    Ok(())
}
