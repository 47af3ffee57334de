mod app;
mod error;
mod keys;
mod lifecycle;
mod logging;
mod runner;
mod ui;
mod zellij;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use devmux_core::config::{ConfigError, DEFAULT_CONFIG_FILE, RuntimeConfig};

use crate::app::RunOutcome;

#[derive(Parser)]
#[command(name = "devmux")]
#[command(about = "Run every service of a project in one terminal", long_about = None)]
struct Cli {
    /// Project config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Where to write devmux's own logs
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all services in tabs (default)
    Dev,
    /// Write a zellij layout and config for the project
    Zellij,
}

const NO_SERVICES: &str = "No services found";

/// `None` when there is nothing to run.
fn load_config(path: &Path) -> Result<Option<RuntimeConfig>> {
    match RuntimeConfig::load(path) {
        Ok(config) if config.is_empty() => Ok(None),
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::NotFound { path }) => {
            tracing::warn!(path = %path.display(), "config not found");
            Ok(None)
        }
        Err(err) => Err(err).context("failed to load config"),
    }
}

async fn run_dev(config_path: &Path) -> Result<()> {
    let Some(config) = load_config(config_path)? else {
        eprintln!("{NO_SERVICES}");
        return Ok(());
    };
    tracing::info!(
        project = config.name.as_deref().unwrap_or("-"),
        services = config.services.len(),
        "starting"
    );

    match app::run(config.services).await? {
        RunOutcome::NoServices => eprintln!("{NO_SERVICES}"),
        RunOutcome::Quit => tracing::info!("exited cleanly"),
    }
    Ok(())
}

fn run_zellij(config_path: &Path) -> Result<()> {
    let Some(config) = load_config(config_path)? else {
        eprintln!("{NO_SERVICES}");
        return Ok(());
    };
    let files = zellij::generate(Path::new("."), &config.services)?;
    println!("Generated zellij layout: {}", files.layout.display());
    println!("Generated zellij config: {}", files.config.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = cli.log_file.unwrap_or_else(logging::default_log_file);
    if let Err(err) = logging::init_tracing(&log_file) {
        eprintln!("Warning: logging disabled: {err:#}");
    }

    let result = match cli.command.unwrap_or(Commands::Dev) {
        Commands::Dev => run_dev(&cli.config).await,
        Commands::Zellij => run_zellij(&cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "fatal");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
