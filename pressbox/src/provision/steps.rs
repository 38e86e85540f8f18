//! Static step table of the provisioning pipeline

use progress_stream::action;

use crate::provision::fsm::ProvisionState;

/// Operation performed by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    CreateSandbox,
    InstallRuntime,
    FetchApp,
    FixPermissions,
    WriteAppConfig,
    WriteServerConfig,
    ValidateServerConfig,
    StartServices,
    Publish,
}

/// What a step tells the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Silent step
    None,

    /// Announced before the step runs
    Progress {
        action: &'static str,
        text: &'static str,
    },

    /// Terminal success record, emitted after the step succeeds
    Ready { text: &'static str },
}

impl Emission {
    pub fn is_some(&self) -> bool {
        !matches!(self, Emission::None)
    }
}

/// One row of the step table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    pub ordinal: u32,
    pub label: &'static str,
    pub action: StepAction,
    pub emission: Emission,
    /// State reached when the step succeeds
    pub completes: Option<ProvisionState>,
}

/// Placeholder replaced with the served port in announcement texts
pub const PORT_PLACEHOLDER: &str = "{port}";

pub const STEPS: [StepDescriptor; 9] = [
    StepDescriptor {
        ordinal: 1,
        label: "create",
        action: StepAction::CreateSandbox,
        emission: Emission::Progress {
            action: action::SANDBOX_CREATE,
            text: "Creating sandbox...",
        },
        completes: Some(ProvisionState::Created),
    },
    StepDescriptor {
        ordinal: 2,
        label: "install",
        action: StepAction::InstallRuntime,
        emission: Emission::Progress {
            action: action::PROCESSING,
            text: "Installing PHP, nginx and php-fpm...",
        },
        completes: Some(ProvisionState::RuntimeInstalled),
    },
    StepDescriptor {
        ordinal: 3,
        label: "fetch",
        action: StepAction::FetchApp,
        emission: Emission::Progress {
            action: action::PROCESSING,
            text: "Downloading WordPress...",
        },
        completes: Some(ProvisionState::AppFetched),
    },
    StepDescriptor {
        ordinal: 4,
        label: "permissions",
        action: StepAction::FixPermissions,
        emission: Emission::None,
        completes: None,
    },
    StepDescriptor {
        ordinal: 5,
        label: "wp-config",
        action: StepAction::WriteAppConfig,
        emission: Emission::Progress {
            action: action::PROCESSING,
            text: "Configuring WordPress database...",
        },
        completes: Some(ProvisionState::ConfigWritten),
    },
    StepDescriptor {
        ordinal: 6,
        label: "server-config",
        action: StepAction::WriteServerConfig,
        emission: Emission::Progress {
            action: action::PROCESSING,
            text: "Configuring nginx and php-fpm...",
        },
        completes: Some(ProvisionState::ServerConfigured),
    },
    StepDescriptor {
        ordinal: 7,
        label: "validate",
        action: StepAction::ValidateServerConfig,
        emission: Emission::Progress {
            action: action::PROCESSING,
            text: "Validating server configuration...",
        },
        completes: Some(ProvisionState::ServerValidated),
    },
    StepDescriptor {
        ordinal: 8,
        label: "start",
        action: StepAction::StartServices,
        emission: Emission::Progress {
            action: action::PROCESSING,
            text: "Starting services on :{port}...",
        },
        completes: Some(ProvisionState::ServicesStarted),
    },
    StepDescriptor {
        ordinal: 9,
        label: "publish",
        action: StepAction::Publish,
        emission: Emission::Ready {
            text: "Sandbox ready! ✅",
        },
        completes: Some(ProvisionState::Ready),
    },
];

/// Number of steps that emit a record, i.e. `totalSteps`
pub fn total_steps() -> u32 {
    STEPS.iter().filter(|step| step.emission.is_some()).count() as u32
}
