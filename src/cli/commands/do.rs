//! Do command - carry out a single natural-language request.

use crate::agent::Agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the do command.
pub async fn run_do(request: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Agent, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'fjern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.agent.model = model;
    }

    let spinner = Output::spinner("Connecting to the tool server...");
    let agent = match Agent::connect(&settings).await {
        Ok(agent) => agent,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Could not reach the tool server: {}", e));
            Output::info("Start it with 'fjern serve', or point tool_server.url elsewhere.");
            return Err(e.into());
        }
    };

    spinner.set_message("Working...");

    match agent.run(request).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.content);

            if !response.tool_calls.is_empty() {
                Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
                for call in &response.tool_calls {
                    Output::list_item(&format!("{} {}", call.name, truncate(&call.arguments, 60)));
                }
                println!();
            }

            Output::info(&format!(
                "Completed in {} iteration(s)",
                response.iterations
            ));
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Agent failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Shorten a string for display, counting chars so multibyte arguments
/// (Japanese channel titles are routine here) never split mid-character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_untouched() {
        assert_eq!(truncate("short", 60), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_truncate_multibyte_arguments() {
        let args = r#"{"uri":"tv:isdbt?trip=1","title":"NHK総合・東京 地上デジタル放送"}"#;
        for max_len in 10..args.chars().count() {
            let cut = truncate(args, max_len);
            assert!(cut.ends_with("..."));
            assert!(cut.chars().count() <= max_len);
        }
    }
}
