//! Error types for the progress stream

use thiserror::Error;

/// Errors raised while encoding or decoding progress records
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Record is not valid UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Stream already closed")]
    Closed,

    #[error("Step {step} follows step {last}; steps must not decrease")]
    StepRegression { last: u32, step: u32 },
}
