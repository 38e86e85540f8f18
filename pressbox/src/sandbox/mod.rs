//! Sandbox capability
//!
//! The remote environment and the command transport are injected through
//! [`SandboxProvider`] and [`RemoteExecutor`].

pub mod executor;
pub mod http;
pub mod lease;
pub mod teardown;

pub use executor::{
    CommandOutput, CommandSpec, Environment, EnvironmentSpec, EnvironmentState, FileWrite,
    RemoteExecutor, Route, SandboxProvider,
};
pub use lease::{Lease, LeaseRegistry};
pub use teardown::{teardown, StopOutcome};
