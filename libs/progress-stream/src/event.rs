//! Progress record schema

use serde::{Deserialize, Serialize};

/// Well-known values of the `action` field
pub mod action {
    pub const SANDBOX_CREATE: &str = "sandbox-create";
    pub const PROCESSING: &str = "processing";
    pub const READY: &str = "ready";
    pub const ERROR: &str = "error";
}

/// One progress record
///
/// Serialized with the wire field names `action`, `step`, `totalSteps`,
/// `text` and `sandboxUrl`. `sandboxUrl` is only present on `ready` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Status tag, see [`action`]
    pub action: String,

    /// Run-wide ordinal, starting at 1 (0 only for a pre-pipeline error)
    pub step: u32,

    /// Number of announced steps in the run
    pub total_steps: u32,

    /// Human-readable message
    pub text: String,

    /// Public URL of the sandbox, only on `ready`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_url: Option<String>,
}

/// Classification of a record by its action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Progress,
    Ready,
    Error,
}

impl ProgressEvent {
    /// Create an in-progress record
    pub fn progress(
        action: impl Into<String>,
        step: u32,
        total_steps: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            step,
            total_steps,
            text: text.into(),
            sandbox_url: None,
        }
    }

    /// Create the terminal success record
    pub fn ready(
        step: u32,
        total_steps: u32,
        text: impl Into<String>,
        sandbox_url: impl Into<String>,
    ) -> Self {
        Self {
            action: action::READY.to_string(),
            step,
            total_steps,
            text: text.into(),
            sandbox_url: Some(sandbox_url.into()),
        }
    }

    /// Create the terminal failure record
    pub fn error(step: u32, total_steps: u32, text: impl Into<String>) -> Self {
        Self {
            action: action::ERROR.to_string(),
            step,
            total_steps,
            text: text.into(),
            sandbox_url: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.action.as_str() {
            action::READY => EventKind::Ready,
            action::ERROR => EventKind::Error,
            _ => EventKind::Progress,
        }
    }

    /// Whether this record ends the stream
    pub fn is_terminal(&self) -> bool {
        self.kind() != EventKind::Progress
    }
}
