//! Error types for pressbox

use thiserror::Error;

/// Main error type for pressbox
#[derive(Error, Debug)]
pub enum PressboxError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Sandbox error: {0}")]
    SandboxError(#[from] SandboxError),

    #[error("Provisioning error: {0}")]
    ProvisionError(#[from] ProvisionError),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),
}

impl From<ConfigError> for PressboxError {
    fn from(err: ConfigError) -> Self {
        PressboxError::ConfigError(err.to_string())
    }
}

/// Errors from the sandbox capability (provider and remote executor)
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Sandbox API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Sandbox not found: {0}")]
    NotFound(String),

    #[error("Sandbox {0} is in use by another provisioning run")]
    Leased(String),

    #[error("Invalid sandbox API response: {0}")]
    InvalidResponse(String),
}

/// Errors from the config generator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set and the database overrides are incomplete")]
    MissingConnectionString(&'static str),

    #[error("Invalid database connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Database {0} could not be resolved")]
    MissingField(&'static str),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Fatal provisioning failures, one variant per pipeline step class
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("sandbox creation failed: {0}")]
    CreateError(String),

    #[error("runtime install failed: {0}")]
    InstallError(String),

    #[error("application fetch failed: {0}")]
    FetchError(String),

    #[error("configuration failed: {0}")]
    ConfigError(String),

    #[error("server configuration invalid: {0}")]
    ValidationError(String),

    #[error("service startup failed: {0}")]
    StartupError(String),
}

impl ProvisionError {
    /// Short name of the failing step class
    pub fn class(&self) -> &'static str {
        match self {
            ProvisionError::CreateError(_) => "creation",
            ProvisionError::InstallError(_) => "install",
            ProvisionError::FetchError(_) => "fetch",
            ProvisionError::ConfigError(_) => "configuration",
            ProvisionError::ValidationError(_) => "validation",
            ProvisionError::StartupError(_) => "startup",
        }
    }
}

impl From<ConfigError> for ProvisionError {
    fn from(err: ConfigError) -> Self {
        ProvisionError::ConfigError(err.to_string())
    }
}
