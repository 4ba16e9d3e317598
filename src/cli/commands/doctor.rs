//! Doctor command - verify configuration and connectivity.

use crate::cli::Output;
use crate::config::Settings;
use crate::tv::{BraviaClient, TvControl};
use console::style;
use std::time::Duration;
use url::Url;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Fjern Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key();
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("TV").bold());
    let tv_checks = check_tv(settings).await;
    for check in &tv_checks {
        check.print();
    }
    checks.extend(tv_checks);

    println!();

    println!("{}", style("Tool Server").bold());
    let server_check = check_tool_server(settings).await;
    server_check.print();
    checks.push(server_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Fjern.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Fjern is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check TV settings and, if configured, whether the TV answers.
async fn check_tv(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let Some(base_url) = settings.tv.base_url() else {
        results.push(CheckResult::warning(
            "TV host",
            "not configured",
            "Set TV_IP (or [tv] host in the config) to control a TV",
        ));
        return results;
    };
    results.push(CheckResult::ok("TV host", &base_url));

    let Some(psk) = settings.tv.psk.clone().filter(|p| !p.is_empty()) else {
        results.push(CheckResult::error(
            "TV PSK",
            "not configured",
            "Set TV_PSK to the pre-shared key from the TV's network settings",
        ));
        return results;
    };
    results.push(CheckResult::ok("TV PSK", "configured"));

    match BraviaClient::new(&base_url, &psk) {
        Ok(tv) => match tv.power_status().await {
            Ok(status) => results.push(CheckResult::ok(
                "TV connection",
                &format!("reachable (power: {})", status.as_display()),
            )),
            Err(e) => results.push(CheckResult::error(
                "TV connection",
                &format!("not reachable: {}", e),
                "Check that the TV is on the network and the PSK matches",
            )),
        },
        Err(e) => results.push(CheckResult::error(
            "TV connection",
            &format!("client error: {}", e),
            "Check the [tv] settings",
        )),
    }

    results
}

/// Check whether the configured tool server answers on its health endpoint.
async fn check_tool_server(settings: &Settings) -> CheckResult {
    let url = &settings.tool_server.url;

    let health_url = match Url::parse(url).and_then(|u| u.join("/health")) {
        Ok(u) => u,
        Err(e) => {
            return CheckResult::error(
                "Tool server URL",
                &format!("invalid: {}", e),
                "Check the [tool_server] url setting",
            )
        }
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult::error(
                "Tool server",
                &format!("client error: {}", e),
                "Check the [tool_server] settings",
            )
        }
    };

    match client.get(health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            CheckResult::ok("Tool server", &format!("reachable at {}", url))
        }
        Ok(resp) => CheckResult::warning(
            "Tool server",
            &format!("answered with {}", resp.status()),
            "The server is up but the health check failed",
        ),
        Err(_) => CheckResult::warning(
            "Tool server",
            &format!("not reachable at {}", url),
            "Start it with: fjern serve",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: fjern init (or fjern config edit)",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[tokio::test]
    async fn test_tv_checks_without_host() {
        let settings = Settings::default();
        let results = check_tv(&settings).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Warning);
    }
}
