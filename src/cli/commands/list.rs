//! List command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::storage::{list_records, DataLayout};
use anyhow::Result;

/// Run the list command.
pub fn run_list(settings: &Settings) -> Result<()> {
    preflight::check(Operation::List)?;
    let layout = DataLayout::new(settings.data_dir());

    match list_records(&layout) {
        Ok(records) => {
            if records.is_empty() {
                Output::info("No videos ingested yet. Use 'vidmind ingest <url>' to add one.");
            } else {
                Output::header(&format!("Ingested Videos ({})", records.len()));
                println!();

                for record in &records {
                    Output::video_info(
                        &record.metadata.title,
                        &record.video_id,
                        &record.metadata.url,
                        record.metadata.text.chars().count(),
                    );
                }

                println!();
                Output::kv("Total videos", &records.len().to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
