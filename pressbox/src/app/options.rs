//! Application configuration options

use std::time::Duration;

use crate::config::{StackLayout, WordPressOptions};
use crate::errors::ConfigError;
use crate::provision::readiness::ReadinessOptions;
use crate::sandbox::EnvironmentSpec;
use crate::storage::settings::Settings;
use crate::utils::CooldownOptions;

/// Options for one provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Resources requested for the sandbox
    pub environment: EnvironmentSpec,

    /// Remote paths of the stack
    pub layout: StackLayout,

    /// WordPress archive, fetched over https
    pub archive_url: String,

    /// Packages installed with dnf
    pub packages: Vec<String>,

    /// Rendered into wp-config.php
    pub wordpress: WordPressOptions,

    /// Service readiness polling
    pub readiness: ReadinessOptions,

    /// Stop the sandbox when provisioning fails
    pub teardown_on_failure: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ProvisionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let stack = &settings.stack;
        Self {
            environment: EnvironmentSpec {
                vcpus: settings.sandbox.vcpus,
                ports: vec![settings.sandbox.port],
                timeout_ms: settings.sandbox.timeout_secs.saturating_mul(1000),
                runtime: settings.sandbox.runtime.clone(),
            },
            layout: StackLayout {
                work_dir: stack.work_dir.clone(),
                app_dir_name: stack.app_dir_name.clone(),
                web_user: stack.web_user.clone(),
                fpm_socket: stack.fpm_socket.clone(),
                port: settings.sandbox.port,
            },
            archive_url: stack.archive_url.clone(),
            packages: stack.packages.clone(),
            wordpress: WordPressOptions {
                table_prefix: stack.table_prefix.clone(),
                debug: stack.debug,
            },
            readiness: ReadinessOptions {
                max_attempts: settings.readiness.max_attempts,
                cooldown: CooldownOptions {
                    base_delay: Duration::from_millis(settings.readiness.base_delay_ms),
                    max_delay: Duration::from_millis(settings.readiness.max_delay_ms),
                    ..Default::default()
                },
            },
            teardown_on_failure: settings.teardown_on_failure,
        }
    }

    /// Port served by nginx and exposed publicly
    pub fn port(&self) -> u16 {
        self.layout.port
    }

    /// Reject options no run could succeed with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidSetting(msg));

        if self.environment.vcpus == 0 {
            return invalid("sandbox.vcpus must be at least 1".to_string());
        }
        if self.layout.port == 0 {
            return invalid("sandbox.port must not be 0".to_string());
        }
        if !self.environment.ports.contains(&self.layout.port) {
            return invalid(format!("port {} is not exposed", self.layout.port));
        }
        if !self.layout.work_dir.starts_with('/') {
            return invalid(format!(
                "stack.work_dir must be absolute, got {}",
                self.layout.work_dir
            ));
        }
        if self.layout.app_dir_name.is_empty() || self.layout.app_dir_name.contains('/') {
            return invalid(format!(
                "stack.app_dir_name must be a single path segment, got {:?}",
                self.layout.app_dir_name
            ));
        }
        if !self.archive_url.starts_with("https://") {
            return invalid(format!(
                "stack.archive_url must use https, got {}",
                self.archive_url
            ));
        }
        if self.packages.is_empty() {
            return invalid("stack.packages must not be empty".to_string());
        }
        if self.readiness.max_attempts == 0 {
            return invalid("readiness.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
        }
    }
}
