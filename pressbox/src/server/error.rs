//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::SandboxError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// The sandbox is leased by a running provisioning run
    Conflict(String),

    /// The sandbox API failed
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => {
                tracing::error!("Sandbox API error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Leased(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
