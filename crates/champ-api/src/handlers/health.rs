//! Health check handlers.

use axum::extract::State;
use axum::Json;
use champ_media::PipelineCapabilities;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub pipeline: PipelineCapabilities,
}

/// Readiness check endpoint.
///
/// Always 200: a pipeline without a decoder still answers uploads with the
/// stub result, so the service is usable. `status` is `degraded` in that case.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let pipeline = state.pipeline.capabilities();
    let status = if pipeline.decoder.is_some() {
        "ready"
    } else {
        "degraded"
    };
    Json(ReadinessResponse {
        status: status.to_string(),
        pipeline,
    })
}

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Sports Talent Assessment API",
    })
}
