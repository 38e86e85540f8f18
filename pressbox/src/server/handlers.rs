//! HTTP request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::{info, warn};

use crate::provision::steps::total_steps;
use crate::provision::ChannelSink;
use crate::sandbox::teardown;
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "pressbox".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Progress stream handler
///
/// Starts one provisioning run and streams its records as they are
/// produced. The run is detached from the request: a client that
/// disconnects only stops reading.
pub async fn sandbox_handler(State(state): State<Arc<ServerState>>) -> Response {
    let (mut sink, receiver) = ChannelSink::new(total_steps());

    match state.pipeline() {
        Ok(pipeline) => {
            tokio::spawn(async move {
                match pipeline.run_with_progress(&mut sink).await {
                    Ok(deployment) => info!(
                        "Provisioned sandbox {} at {}",
                        deployment.environment.id, deployment.url
                    ),
                    Err(e) => warn!("Provisioning run failed: {}", e),
                }
            });
        }
        Err(e) => {
            warn!("Refusing to provision: {}", e);
            sink.abort(&format!("Error: {}", e));
        }
    }

    let stream = UnboundedReceiverStream::new(receiver).map(Ok::<_, Infallible>);

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Teardown response
#[derive(Debug, Serialize)]
pub struct TeardownResponse {
    pub id: String,
    pub outcome: String,
}

/// Teardown handler. Refuses while a provisioning run holds the sandbox.
pub async fn teardown_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TeardownResponse>> {
    if state.leases.is_leased(&id) {
        return Err(ApiError::Conflict(format!(
            "sandbox {} is still being provisioned",
            id
        )));
    }

    let outcome = teardown(state.provider.as_ref(), &id).await?;
    Ok(Json(TeardownResponse {
        id,
        outcome: outcome.as_str().to_string(),
    }))
}
