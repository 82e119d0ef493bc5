//! Sanad CLI - Command-line interface for the Sanad grading engine.

use anyhow::Context;
use clap::Parser;
use sanad_cli::commands;
use sanad_cli::{Cli, Command, Config, Formatter};
use sanad_domain::DispositionAction;
use sanad_engine::SanadEngine;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let config = Config::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Grade(args) => {
            let engine_config = args.preset.map(Into::into).unwrap_or_else(|| config.engine.clone());
            let engine = Arc::new(SanadEngine::new(engine_config)?);
            commands::execute_grade(args, engine, &formatter).await?;
        }
        Command::Cure(args) => {
            commands::execute_disposition(args, DispositionAction::Cure, &formatter).await?;
        }
        Command::Waive(args) => {
            commands::execute_disposition(args, DispositionAction::Waive, &formatter).await?;
        }
        Command::Tiers => {
            let engine = SanadEngine::new(config.engine.clone())?;
            commands::execute_tiers(&engine, &formatter).await?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter).await?;
        }
    }

    Ok(())
}
