//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::Session;
use crate::storage::check_video_id;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(video: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask(settings.rag.backend)) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidmind doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(id) = &video {
        check_video_id(id)?;
    }

    let orchestrator = Orchestrator::new(settings).await?;
    let mut session = Session::new(video);

    println!("\n{}", style("vidmind chat").bold().cyan());
    if let Some(id) = &session.video_id {
        println!("{}", style(format!("Scoped to video {}", id)).dim());
    }
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        match orchestrator.ask(&mut session, input).await {
            Ok(answer) => {
                if let Some(error) = answer.generation.error() {
                    Output::error(&format!("{} ({})", answer.generation.text(), error));
                } else {
                    println!(
                        "\n{} {}\n",
                        style("vidmind:").cyan().bold(),
                        answer.generation.text()
                    );
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
