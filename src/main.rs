//! vidmind CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidmind::cli::{commands, Cli, Commands};
use vidmind::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; keys may come from the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging; -v flags override the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidmind={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ingest {
            url,
            summary,
            no_summary,
        } => {
            std::fs::create_dir_all(settings.data_dir())?;
            commands::run_ingest(url, summary, *no_summary, settings).await?;
        }

        Commands::Ask {
            question,
            video,
            top_k,
            backend,
        } => {
            if let Some(backend) = backend {
                settings.rag.backend = *backend;
            }
            commands::run_ask(question, video.clone(), *top_k, settings).await?;
        }

        Commands::Chat { video, backend } => {
            if let Some(backend) = backend {
                settings.rag.backend = *backend;
            }
            commands::run_chat(video.clone(), settings).await?;
        }

        Commands::Summarize { video_id, kind } => {
            commands::run_summarize(video_id, kind, settings).await?;
        }

        Commands::List => {
            commands::run_list(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
