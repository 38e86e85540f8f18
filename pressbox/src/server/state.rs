//! Server state

use std::sync::Arc;

use crate::app::options::ProvisionOptions;
use crate::config::EnvSource;
use crate::errors::ProvisionError;
use crate::provision::Pipeline;
use crate::sandbox::{LeaseRegistry, SandboxProvider};

/// Server state shared across handlers
pub struct ServerState {
    pub provider: Arc<dyn SandboxProvider>,
    pub leases: LeaseRegistry,
    pub env: Arc<dyn EnvSource>,
    pub options: ProvisionOptions,
}

impl ServerState {
    pub fn new(
        provider: Arc<dyn SandboxProvider>,
        leases: LeaseRegistry,
        env: Arc<dyn EnvSource>,
        options: ProvisionOptions,
    ) -> Self {
        Self {
            provider,
            leases,
            env,
            options,
        }
    }

    /// Pipeline for one provisioning request
    pub fn pipeline(&self) -> Result<Pipeline, ProvisionError> {
        Pipeline::new(
            self.provider.clone(),
            self.leases.clone(),
            self.env.clone(),
            self.options.clone(),
        )
    }
}
