//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Fjern Setup");
    println!();
    println!("Welcome to Fjern! Let's make sure everything is configured correctly.\n");

    // Step 1: Check API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Fjern requires an OpenAI API key for the conversational agent.");
        println!(
            "  Get your API key from: {}",
            style("https://platform.openai.com/api-keys").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'fjern init' again.");
            return Ok(());
        }
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 2: Check TV settings
    println!("{}", style("Step 2: Checking TV settings").bold().cyan());
    println!();

    match settings.tv.base_url() {
        Some(base_url) => {
            Output::success(&format!("TV host is configured: {}", base_url));
            if settings.tv.psk.as_deref().unwrap_or("").is_empty() {
                Output::warning("TV pre-shared key is not set.");
                println!(
                    "  Enable 'Pre-Shared Key' in the TV's network settings, then: {}",
                    style("export TV_PSK='...'").green()
                );
            } else {
                Output::success("TV pre-shared key is configured!");
            }
        }
        None => {
            Output::warning("TV host is not configured.");
            println!();
            println!("  Fjern talks to a Sony Bravia TV over its IP control interface.");
            println!("  Point it at your TV:");
            println!("  {}", style("export TV_IP='192.168.2.250'").green());
            println!("  {}", style("export TV_PSK='0000'").green());
            println!();

            if !prompt_continue("Continue without TV settings?")? {
                println!();
                Output::info("Setup cancelled. Set TV_IP and TV_PSK and run 'fjern init' again.");
                return Ok(());
            }
        }
    }

    println!();

    // Step 3: Create directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    println!();

    // Step 4: Create config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("fjern config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check configuration and connectivity", style("fjern doctor").cyan());
    println!("  {} Start the tool server", style("fjern serve").cyan());
    println!(
        "  {} Tell the TV what to do",
        style("fjern do \"turn on the tv\"").cyan()
    );
    println!();
    println!("For more help: {}", style("fjern --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
