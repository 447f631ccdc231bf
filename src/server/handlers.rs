//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::data::{DataFormat, DatasetLoader, DatasetProfile};
use crate::pipeline::{PipelineRequest, PipelineResult};

use super::error::{Result, ServerError};
use super::state::AppState;

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to ML Builder API" }))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ============================================================================
// Data Handlers
// ============================================================================

/// Store an uploaded dataset and return its profile
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DatasetProfile>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ServerError::BadRequest("Uploaded file has no name".to_string()))?;

        if DataFormat::from_path(&file_name).is_none() {
            return Err(ServerError::BadRequest(format!(
                "Invalid file format. Please upload one of: {}.",
                DataFormat::extensions().join(", ")
            )));
        }
        let path = state
            .loader()
            .path_for(&file_name)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        let data = field.bytes().await.map_err(multipart_error)?;
        info!(file = %file_name, bytes = data.len(), "Received dataset upload");

        tokio::fs::create_dir_all(state.loader().upload_dir()).await?;
        tokio::fs::write(&path, &data).await?;

        let profile = tokio::task::spawn_blocking(move || {
            let df = DatasetLoader::load(&path)?;
            DatasetProfile::from_frame(file_name, &df)
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(|e| ServerError::Processing(format!("Failed to process file: {}", e)))?;

        info!(
            file = %profile.filename,
            rows = profile.rows,
            columns = profile.columns,
            "Dataset stored"
        );
        return Ok(Json(profile));
    }

    Err(ServerError::BadRequest("No file uploaded".to_string()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(e.body_text())
    } else {
        ServerError::BadRequest(e.body_text())
    }
}

// ============================================================================
// Pipeline Handlers
// ============================================================================

/// Run a pipeline synchronously. The outcome, failed or not, is always the
/// structured result.
pub async fn run_pipeline(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PipelineRequest>,
) -> Result<Json<PipelineResult>> {
    let result = tokio::task::spawn_blocking(move || state.executor.run(&request))
        .await
        .map_err(|e| ServerError::Internal(format!("Pipeline task failed: {}", e)))?;

    Ok(Json(result))
}

// ============================================================================
// Model Handlers
// ============================================================================

/// Serve a stored model artifact as an attachment
pub async fn download_model(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let bytes = state.store().read_bytes(&filename).map_err(|e| {
        warn!(file = %filename, error = %e, "Model download failed");
        ServerError::NotFound("Model file not found".to_string())
    })?;

    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition)
                    .map_err(|e| ServerError::Internal(format!("Invalid header: {}", e)))?,
            ),
        ],
        bytes,
    ))
}
