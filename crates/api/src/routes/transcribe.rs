//! Job submission and observation endpoints.
//!
//! Upload persists the input file first, then enqueues; the request
//! returns as soon as the envelope is accepted. Progress streams over
//! the per-job WebSocket.

use axum::extract::{Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use murmur_core::job::{JobEnvelope, JobId, JobOptions};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws;

/// Response for an accepted submission.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    pub filename: String,
    pub status: &'static str,
}

/// POST /api/v1/transcribe/upload
///
/// Multipart body with a `file` field; job options come from the query
/// string. Returns `503 QUEUE_FULL` when the queue is at capacity.
async fn upload(
    State(state): State<AppState>,
    Query(options): Query<JobOptions>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut file: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file = Some((filename, data));
        }
    }

    let (filename, data) = file.ok_or_else(|| AppError::BadRequest("Missing 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let job_id = uuid::Uuid::new_v4();
    let input_path = state.storage.upload_path(job_id, &filename);

    tokio::fs::write(&input_path, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to persist upload: {e}")))?;

    let envelope = JobEnvelope {
        id: job_id,
        input_path: input_path.clone(),
        options,
        submitted_at: chrono::Utc::now(),
    };

    if let Err(e) = state.queue.enqueue(envelope) {
        // The rejected upload would otherwise sit until the retention
        // sweep; drop it now.
        let _ = tokio::fs::remove_file(&input_path).await;
        return Err(e.into());
    }

    tracing::info!(%job_id, filename = %filename, depth = state.queue.depth(), "Job queued");

    Ok(Json(UploadResponse {
        job_id,
        filename,
        status: "queued",
    }))
}

/// Mount submission and observation routes under `/transcribe`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/ws/{job_id}", get(ws::ws_handler))
}
