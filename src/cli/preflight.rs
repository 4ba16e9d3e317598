//! Pre-flight checks before operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{FjernError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Agent conversations require the model API key.
    Agent,
    /// Serving the TV tools requires TV connection settings.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Agent => {
            check_api_key()?;
        }
        Operation::Serve => {
            check_tv_settings(settings)?;
        }
    }
    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(FjernError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(FjernError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the TV host and pre-shared key are configured.
fn check_tv_settings(settings: &Settings) -> Result<()> {
    if settings.tv.host.as_deref().unwrap_or("").is_empty() {
        return Err(FjernError::Config(
            "TV host not configured. Set TV_IP or the [tv] host setting.".to_string(),
        ));
    }
    if settings.tv.psk.as_deref().unwrap_or("").is_empty() {
        return Err(FjernError::Config(
            "TV pre-shared key not configured. Set TV_PSK or the [tv] psk setting.".to_string(),
        ));
    }
    Ok(())
}
