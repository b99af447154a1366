//! Video upload and scoring.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use champ_models::InferenceResult;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the video.
pub const UPLOAD_FIELD: &str = "file";

/// Score an uploaded video and remember it as the latest result.
///
/// The pipeline is blocking, so it runs on tokio's blocking pool. It never
/// fails; an unreadable video comes back as the "No Data" result.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<InferenceResult>> {
    let mut video = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
        info!(filename = ?filename, bytes = bytes.len(), "Video upload received");
        video = Some(bytes);
        break;
    }

    let video = video.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
    metrics::record_upload(video.len());

    let pipeline = Arc::clone(&state.pipeline);
    let result = tokio::task::spawn_blocking(move || pipeline.process_video(&video))
        .await
        .map_err(|e| {
            warn!(error = %e, "Scoring task did not complete");
            ApiError::internal(format!("Scoring task failed: {e}"))
        })?;

    let result = Arc::new(result);
    state.latest.store(Arc::clone(&result)).await;
    Ok(Json(result.as_ref().clone()))
}
