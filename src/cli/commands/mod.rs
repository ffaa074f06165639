//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod ingest;
mod list;
mod summarize;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use list::run_list;
pub use summarize::run_summarize;
