//! Pressbox - Entry Point
//!
//! Provisions a WordPress sandbox for builds and previews.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use pressbox::commands::{handle_command, CliContext, Commands};
use pressbox::config::{EnvSource, ProcessEnv};
use pressbox::filesys::file::File;
use pressbox::logs::{init_logging, LogOptions};
use pressbox::storage::settings::Settings;

const DEFAULT_SETTINGS_FILE: &str = "pressbox.json";

#[derive(Parser)]
#[command(name = "pressbox", version)]
#[command(about = "Provision a WordPress sandbox and stream its progress", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./pressbox.json when present)
    #[arg(long, env = "PRESSBOX_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env.<NODE_ENV> before anything reads the environment
    let env_file = format!(
        ".env.{}",
        ProcessEnv.non_empty("NODE_ENV").unwrap_or_else(|| "local".to_string())
    );
    let loaded_env_file = dotenvy::from_filename(&env_file).is_ok();

    let cli = Cli::parse();

    // Retrieve the settings file
    let settings_file = match cli.settings {
        Some(path) => Some(File::new(path)),
        None => {
            let default = File::new(DEFAULT_SETTINGS_FILE);
            if default.exists().await {
                Some(default)
            } else {
                None
            }
        }
    };
    let mut settings = match Settings::load(settings_file.as_ref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = settings.apply_env(&ProcessEnv) {
        eprintln!("Invalid environment override: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }
    if loaded_env_file {
        debug!("Loaded environment from {}", env_file);
    }

    let ctx = CliContext::new(settings, Arc::new(ProcessEnv));

    match handle_command(cli.command, &ctx).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
