//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod build;
mod init;
mod serve;
mod teardown;
mod watch;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Subcommand;
use secrecy::SecretString;
use tracing::debug;

use crate::app::options::ProvisionOptions;
use crate::config::EnvSource;
use crate::filesys::file::File;
use crate::provision::Pipeline;
use crate::sandbox::http::HttpSandboxProvider;
use crate::sandbox::{LeaseRegistry, SandboxProvider};
use crate::storage::settings::Settings;

/// Environment variable holding the sandbox API token
pub const TOKEN_VAR: &str = "SANDBOX_API_TOKEN";

/// Top-level CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the progress endpoint over HTTP
    Serve,

    /// Provision a sandbox and write the sandbox artifact
    Init,

    /// Provision a sandbox, run a build command against it, then tear it down
    Build {
        /// Command to run, with WORDPRESS_URL and SANDBOX_ID in its environment
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Stop the sandbox named in the artifact and delete the artifact
    Teardown,

    /// Follow a progress endpoint and print its records
    Watch {
        /// Progress endpoint URL
        #[arg(default_value = "http://127.0.0.1:8080/api/sandbox")]
        url: String,
    },
}

/// Everything a command needs from the environment
pub struct CliContext {
    pub settings: Settings,
    pub env: Arc<dyn EnvSource>,
    provider: Option<Arc<dyn SandboxProvider>>,
}

impl CliContext {
    pub fn new(settings: Settings, env: Arc<dyn EnvSource>) -> Self {
        Self {
            settings,
            env,
            provider: None,
        }
    }

    /// Use `provider` instead of the sandbox API
    pub fn with_provider(mut self, provider: Arc<dyn SandboxProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sandbox provider configured from settings and `SANDBOX_API_TOKEN`
    pub fn provider(&self) -> Result<Arc<dyn SandboxProvider>> {
        if let Some(provider) = &self.provider {
            return Ok(provider.clone());
        }

        let Some(token) = self.env.non_empty(TOKEN_VAR) else {
            bail!("{} is not set", TOKEN_VAR);
        };
        let provider =
            HttpSandboxProvider::new(&self.settings.provider.base_url, SecretString::from(token))?;
        debug!("Using sandbox API at {}", provider.base_url());
        Ok(Arc::new(provider))
    }

    pub fn provision_options(&self) -> ProvisionOptions {
        ProvisionOptions::from_settings(&self.settings)
    }

    /// Pipeline for a one-shot run against `provider`
    pub fn pipeline(&self, provider: Arc<dyn SandboxProvider>) -> Result<Pipeline> {
        Ok(Pipeline::new(
            provider,
            LeaseRegistry::new(),
            self.env.clone(),
            self.provision_options(),
        )?)
    }

    pub fn artifact_file(&self) -> File {
        File::new(&self.settings.artifact_path)
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, ctx: &CliContext) -> Result<ExitCode> {
    match command {
        Commands::Serve => serve::handle_serve_command(ctx).await,
        Commands::Init => init::handle_init_command(ctx).await,
        Commands::Build { command } => build::handle_build_command(command, ctx).await,
        Commands::Teardown => teardown::handle_teardown_command(ctx).await,
        Commands::Watch { url } => watch::handle_watch_command(&url).await,
    }
}
