use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rategate::{Eligibility, LifecycleEvent, PromptHandle, RatingGate, SqliteStore, StaticMetadata};

mod cli;
mod config;

use cli::commands::Commands;
use cli::{Cli, TerminalHost};
use config::Config;

/// Level for the log file: `--verbose` wins, then `log_level` from the
/// config, then info.
fn log_filter(verbose: bool, log_level: Option<&str>) -> log::LevelFilter {
    if verbose {
        return log::LevelFilter::Debug;
    }
    match log_level.map(|l| l.parse::<log::LevelFilter>()) {
        Some(Ok(level)) => level,
        Some(Err(_)) => {
            eprintln!("{} unknown log_level {:?}, using info", "warning:".yellow(), log_level.unwrap_or_default());
            log::LevelFilter::Info
        }
        None => log::LevelFilter::Info,
    }
}

fn setup_logging(level: log::LevelFilter) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rategate")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("rategate.log");

    // Setup env_logger with file output; RUST_LOG still overrides the level
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized at {}, writing to: {}", level, log_file.display());
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(db) = &cli.db {
        config.store.path = db.clone();
    }
    if let Some(identifier) = &cli.identifier {
        config.app.identifier = identifier.clone();
    }
    if let Some(version) = &cli.app_version {
        config.app.version = version.clone();
    }
    if cli.is_verbose() {
        config.rating.debug_enabled = true;
    }
    config
}

fn build_gate(config: &Config) -> Result<RatingGate> {
    let store = SqliteStore::open_at(&config.store.path)
        .with_context(|| format!("Failed to open store at {}", config.store.path.display()))?;

    let mut metadata = StaticMetadata::new(config.app.version.clone());
    if let Some(name) = &config.app.display_name {
        metadata = metadata.with_display_name(name.clone());
    }

    RatingGate::builder(
        config.app.identifier.clone(),
        Arc::new(store),
        Arc::new(metadata),
        Arc::new(TerminalHost::new()),
    )
    .config(config.rating.clone())
    .build()
    .context("Failed to build rating gate (is app.identifier set?)")
}

async fn finish_prompt(handle: Option<PromptHandle>) {
    match handle {
        Some(handle) => {
            let outcome = handle.outcome().await;
            println!("{} {}", "Prompt outcome:".green(), outcome);
        }
        None => println!("{}", "No prompt this time".dimmed()),
    }
}

fn print_status(gate: &RatingGate, json: bool) -> Result<()> {
    let state = gate.state();
    let eligibility = gate.eligibility();

    if json {
        let report = serde_json::json!({
            "identifier": gate.identifier(),
            "state": state,
            "eligible": eligibility.is_eligible(),
            "reason": eligibility.reason().map(|r| r.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to render status")?);
        return Ok(());
    }

    println!("{} {}", "Identifier:".bold(), gate.identifier());
    println!("  tracked version:      {}", state.current_version.as_deref().unwrap_or("-"));
    println!("  previous version:     {}", state.previous_version.as_deref().unwrap_or("-"));
    println!("  first use:            {}", format_timestamp(state.first_use_date));
    println!("  uses:                 {}", state.use_count);
    println!("  significant events:   {}", state.significant_event_count);
    println!("  reminder requested:   {}", format_timestamp(state.reminder_request_date));
    println!("  rated this version:   {}", state.rated_current_version);
    println!("  rated any version:    {}", state.rated_any_version);
    println!("  declined this version: {}", state.declined_current_version);

    match eligibility {
        Eligibility::Eligible => println!("{}", "Eligible for a rating prompt".green()),
        Eligibility::Bypassed => println!("{}", "Eligible (conditions bypassed)".green()),
        Eligibility::Ineligible(reason) => println!("{} {}", "Not eligible:".yellow(), reason),
    }
    Ok(())
}

fn format_timestamp(epoch_seconds: f64) -> String {
    if epoch_seconds <= 0.0 {
        return "-".to_string();
    }
    chrono::DateTime::from_timestamp_millis((epoch_seconds * 1000.0) as i64)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let gate = build_gate(config)?;

    match &cli.command {
        Commands::Launch => finish_prompt(gate.handle_lifecycle(LifecycleEvent::Launched)).await,
        Commands::Foreground => finish_prompt(gate.handle_lifecycle(LifecycleEvent::WillEnterForeground)).await,
        Commands::Event { prompt } => {
            println!("{}", "Recorded significant event".cyan());
            finish_prompt(gate.record_significant_event(*prompt)).await
        }
        Commands::Status { json } => print_status(&gate, *json)?,
        Commands::Prompt => finish_prompt(gate.show_prompt()).await,
        Commands::Rate => gate.rate(),
        Commands::Reset => {
            gate.reset_all_counters();
            println!("{}", "All counters reset".cyan());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration before logging so the file honors log_level
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let config = apply_overrides(&cli, config);

    setup_logging(log_filter(cli.is_verbose(), config.log_level.as_deref())).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
