//! Sandbox teardown

use tracing::info;

use crate::errors::SandboxError;
use crate::sandbox::executor::{EnvironmentState, SandboxProvider};

/// What a teardown actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The sandbox was running and has been stopped
    Stopped,

    /// The sandbox was not found or had already stopped
    AlreadyGone,
}

impl StopOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopOutcome::Stopped => "stopped",
            StopOutcome::AlreadyGone => "already_stopped",
        }
    }
}

/// Stop a sandbox by id. Not found and already stopped count as success.
pub async fn teardown(provider: &dyn SandboxProvider, id: &str) -> Result<StopOutcome, SandboxError> {
    match provider.get(id).await {
        Ok(environment) if environment.state == EnvironmentState::Stopped => {
            info!("Sandbox {} already stopped", id);
            return Ok(StopOutcome::AlreadyGone);
        }
        Ok(_) => {}
        Err(SandboxError::NotFound(_)) => {
            info!("Sandbox {} not found, nothing to stop", id);
            return Ok(StopOutcome::AlreadyGone);
        }
        Err(e) => return Err(e),
    }

    match provider.stop(id).await {
        Ok(()) => {
            info!("Sandbox {} stopped", id);
            Ok(StopOutcome::Stopped)
        }
        Err(SandboxError::NotFound(_)) => Ok(StopOutcome::AlreadyGone),
        Err(e) => Err(e),
    }
}
