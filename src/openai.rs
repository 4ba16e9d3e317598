//! OpenAI client construction.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

// A conversation turn is a handful of short tool calls; a stuck request
// should fail well before the user gives up on the remote.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Create the chat client used by the agent loop.
///
/// Reads `OPENAI_API_KEY` from the environment via the default config.
pub fn create_client() -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
