//! Settings file management

use serde::{Deserialize, Serialize};

use crate::config::env::EnvSource;
use crate::errors::{ConfigError, PressboxError};
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Pressbox settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Sandbox API configuration
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Resources requested for each sandbox
    #[serde(default)]
    pub sandbox: SandboxSettings,

    /// WordPress stack installed in the sandbox
    #[serde(default)]
    pub stack: StackSettings,

    /// Service readiness polling
    #[serde(default)]
    pub readiness: ReadinessSettings,

    /// Local HTTP server
    #[serde(default)]
    pub server: ServerSettings,

    /// Stop the sandbox when provisioning fails
    #[serde(default)]
    pub teardown_on_failure: bool,

    /// Where `init` and `build` write the sandbox artifact
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
}

fn default_artifact_path() -> String {
    "sandbox.config.mjs".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            provider: ProviderSettings::default(),
            sandbox: SandboxSettings::default(),
            stack: StackSettings::default(),
            readiness: ReadinessSettings::default(),
            server: ServerSettings::default(),
            teardown_on_failure: false,
            artifact_path: default_artifact_path(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, or the defaults when there is none
    pub async fn load(file: Option<&File>) -> Result<Self, PressboxError> {
        match file {
            Some(file) => file.read_json::<Settings>().await,
            None => Ok(Settings::default()),
        }
    }

    /// Apply `PRESSBOX_*` and `SANDBOX_API_URL` overrides
    pub fn apply_env(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        if let Some(level) = env.non_empty("PRESSBOX_LOG_LEVEL") {
            self.log_level = level.parse().map_err(ConfigError::InvalidSetting)?;
        }

        if let Some(url) = env.non_empty("SANDBOX_API_URL") {
            self.provider.base_url = url;
        }

        if let Some(port) = env.non_empty("PRESSBOX_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidSetting(format!("PRESSBOX_PORT={}", port)))?;
        }

        if let Some(flag) = env.non_empty("PRESSBOX_TEARDOWN_ON_FAILURE") {
            self.teardown_on_failure = parse_flag(&flag).ok_or_else(|| {
                ConfigError::InvalidSetting(format!("PRESSBOX_TEARDOWN_ON_FAILURE={}", flag))
            })?;
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Sandbox API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Base URL for the sandbox API
    #[serde(default = "default_provider_url")]
    pub base_url: String,
}

fn default_provider_url() -> String {
    "http://localhost:4000/v1".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
        }
    }
}

/// Sandbox resource settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxSettings {
    #[serde(default = "default_vcpus")]
    pub vcpus: u32,

    /// Port exposed publicly and served by nginx
    #[serde(default = "default_port")]
    pub port: u16,

    /// Lifetime ceiling in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_runtime")]
    pub runtime: String,
}

fn default_vcpus() -> u32 {
    4
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    30 * 60
}

fn default_runtime() -> String {
    "node22".to_string()
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            vcpus: default_vcpus(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            runtime: default_runtime(),
        }
    }
}

/// WordPress stack settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSettings {
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// Directory the archive unpacks to
    #[serde(default = "default_app_dir_name")]
    pub app_dir_name: String,

    #[serde(default = "default_web_user")]
    pub web_user: String,

    #[serde(default = "default_fpm_socket")]
    pub fpm_socket: String,

    /// Packages installed with dnf
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,

    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// `WP_DEBUG`
    #[serde(default = "default_true")]
    pub debug: bool,
}

fn default_work_dir() -> String {
    "/vercel/sandbox".to_string()
}

fn default_archive_url() -> String {
    "https://wordpress.org/latest.tar.gz".to_string()
}

fn default_app_dir_name() -> String {
    "wordpress".to_string()
}

fn default_web_user() -> String {
    "nginx".to_string()
}

fn default_fpm_socket() -> String {
    "/run/php-fpm/pressbox.sock".to_string()
}

fn default_packages() -> Vec<String> {
    [
        "php8.1-cli",
        "php8.1-fpm",
        "php8.1-mysqlnd",
        "php8.1-gd",
        "php8.1-mbstring",
        "php8.1-xml",
        "php8.1-opcache",
        "nginx",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_table_prefix() -> String {
    "wp_".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            archive_url: default_archive_url(),
            app_dir_name: default_app_dir_name(),
            web_user: default_web_user(),
            fpm_socket: default_fpm_socket(),
            packages: default_packages(),
            table_prefix: default_table_prefix(),
            debug: true,
        }
    }
}

/// Readiness polling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Local HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}
