//! Remote executor and sandbox provider traits

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SandboxError;

/// A command to run inside the sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub cmd: String,
    pub args: Vec<String>,
    pub sudo: bool,
    pub detached: bool,
}

impl CommandSpec {
    /// Create a command from a program and its arguments
    pub fn new<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
            sudo: false,
            detached: false,
        }
    }

    /// Run a script through a login bash shell
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("bash", ["-lc".to_string(), script.into()])
    }

    /// Run with elevated privilege
    pub fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    /// Launch in the background without waiting for exit
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Command line as it would be typed, for logs and error messages
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        if self.sudo {
            parts.push("sudo".to_string());
        }
        parts.push(self.cmd.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Result of a finished (or launched, when detached) command
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last few lines of stderr (or stdout when stderr is empty)
    pub fn summary(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.trim().lines().collect();
        let start = lines.len().saturating_sub(5);
        lines[start..].join(" | ")
    }
}

/// A file to write into the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub content: Vec<u8>,
}

impl FileWrite {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Sandbox lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentState {
    Creating,
    #[serde(alias = "running")]
    Active,
    #[serde(alias = "expired", alias = "failed")]
    Stopped,
}

/// Public route to an exposed port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub port: u16,
    pub url: String,
}

/// One remote sandbox instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub state: EnvironmentState,
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Lifetime ceiling after which the provider reclaims the sandbox
    pub timeout_ms: u64,
}

impl Environment {
    /// Public URL of an exposed port
    pub fn domain(&self, port: u16) -> Option<&str> {
        self.routes
            .iter()
            .find(|route| route.port == port)
            .map(|route| route.url.as_str())
    }
}

/// Resource profile requested at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSpec {
    pub vcpus: u32,
    pub ports: Vec<u16>,
    pub timeout_ms: u64,
    pub runtime: String,
}

/// Executes commands and file writes against one sandbox
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// The sandbox this executor is bound to
    fn environment(&self) -> &Environment;

    /// Run a command. Detached commands return as soon as they are launched.
    async fn run_command(&self, command: &CommandSpec) -> Result<CommandOutput, SandboxError>;

    /// Write files as the sandbox's default user
    async fn write_files(&self, files: &[FileWrite]) -> Result<(), SandboxError>;
}

/// Creates, looks up and stops sandboxes
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    async fn create(&self, spec: &EnvironmentSpec) -> Result<Arc<dyn RemoteExecutor>, SandboxError>;

    async fn get(&self, id: &str) -> Result<Environment, SandboxError>;

    async fn stop(&self, id: &str) -> Result<(), SandboxError>;
}
