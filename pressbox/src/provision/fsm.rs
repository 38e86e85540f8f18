//! Finite state machine for a provisioning run

use serde::{Deserialize, Serialize};

/// Provisioning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    /// Nothing has happened yet
    Pending,

    /// Sandbox created
    Created,

    /// PHP, php-fpm and nginx installed
    RuntimeInstalled,

    /// WordPress unpacked in the working directory
    AppFetched,

    /// wp-config.php in place
    ConfigWritten,

    /// nginx and php-fpm configuration in place
    ServerConfigured,

    /// nginx and php-fpm accepted their configuration
    ServerValidated,

    /// Services launched and answering
    ServicesStarted,

    /// Public URL reported to the caller
    Ready,

    /// Provisioning failed
    Failed,
}

impl ProvisionState {
    /// The state that follows this one on the happy path
    pub fn next(&self) -> Option<ProvisionState> {
        match self {
            ProvisionState::Pending => Some(ProvisionState::Created),
            ProvisionState::Created => Some(ProvisionState::RuntimeInstalled),
            ProvisionState::RuntimeInstalled => Some(ProvisionState::AppFetched),
            ProvisionState::AppFetched => Some(ProvisionState::ConfigWritten),
            ProvisionState::ConfigWritten => Some(ProvisionState::ServerConfigured),
            ProvisionState::ServerConfigured => Some(ProvisionState::ServerValidated),
            ProvisionState::ServerValidated => Some(ProvisionState::ServicesStarted),
            ProvisionState::ServicesStarted => Some(ProvisionState::Ready),
            ProvisionState::Ready | ProvisionState::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisionState::Ready | ProvisionState::Failed)
    }
}

/// Provisioning event
#[derive(Debug, Clone)]
pub enum ProvisionEvent {
    /// A step succeeded and reached the given state
    Reached(ProvisionState),

    /// A step failed
    Failed(String),
}

/// Provisioning FSM
#[derive(Debug, Clone)]
pub struct ProvisionFsm {
    state: ProvisionState,
    error: Option<String>,
}

impl ProvisionFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: ProvisionState::Pending,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> ProvisionState {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ProvisionEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            // Terminal states absorb nothing
            (state, _) if state.is_terminal() => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }

            (state, ProvisionEvent::Failed(err)) => {
                tracing::debug!("Provisioning failed in state {:?}", state);
                self.error = Some(err.clone());
                ProvisionState::Failed
            }

            // Strictly linear
            (state, ProvisionEvent::Reached(target)) if state.next() == Some(*target) => *target,

            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for ProvisionFsm {
    fn default() -> Self {
        Self::new()
    }
}
