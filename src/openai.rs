//! HTTP client construction for OpenAI-compatible and plain REST providers.

use crate::error::{Result, VidmindError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for provider requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Build a reqwest client with the default request timeout.
pub fn http_client() -> Result<reqwest::Client> {
    http_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Build a reqwest client with a custom timeout.
pub fn http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(VidmindError::Http)
}

/// Create an OpenAI-compatible client pointed at `api_base`.
///
/// Retries are disabled: a failed request is reported once and must be re-triggered
/// by the user.
pub fn create_client(api_base: &str, api_key: &str) -> Result<Client<OpenAIConfig>> {
    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Ok(Client::with_config(config)
        .with_http_client(http_client()?)
        .with_backoff(no_retry))
}
