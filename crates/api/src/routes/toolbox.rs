//! Synchronous media toolbox: ffmpeg conversion and subtitle burning.
//!
//! These are plain shell-outs with the result streamed straight back to
//! the caller; they do not go through the job queue.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use murmur_core::ffmpeg::{self, VideoCodec};
use murmur_core::storage::sanitize_filename;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_codec")]
    pub codec: String,
}

fn default_format() -> String {
    "mp4".into()
}

fn default_codec() -> String {
    "libx264".into()
}

/// POST /api/v1/toolbox/convert
///
/// Multipart `file` field; target container and codec from the query
/// string. Streams the converted file back.
async fn convert(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let (filename, input_path) = save_field(&state, &mut multipart, "file").await?;

    let stem = Path::new(&filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "converted".into());
    let output_name = format!("{stem}_converted.{}", params.format);
    let output_path = state.storage.output_path(&output_name);

    let codec = VideoCodec::from_request(&params.codec);
    ffmpeg::convert(&input_path, &output_path, codec).await?;

    file_response(&output_path, &output_name).await
}

/// POST /api/v1/toolbox/burn_subtitles
///
/// Multipart `video` and `subtitle` fields. Burns the subtitles in with
/// a fixed style and streams the result back.
async fn burn_subtitles(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut video: Option<(String, PathBuf)> = None;
    let mut subtitle: Option<PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("video") => {
                let (name, path) = save_bytes(&state, field).await?;
                video = Some((name, path));
            }
            Some("subtitle") => {
                let (_, path) = save_bytes(&state, field).await?;
                subtitle = Some(path);
            }
            _ => {}
        }
    }

    let (video_name, video_path) =
        video.ok_or_else(|| AppError::BadRequest("Missing 'video' field".into()))?;
    let subtitle_path =
        subtitle.ok_or_else(|| AppError::BadRequest("Missing 'subtitle' field".into()))?;

    let stem = Path::new(&video_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".into());
    let output_name = format!("{stem}_burned.mp4");
    let output_path = state.storage.output_path(&output_name);

    ffmpeg::burn_subtitles(&video_path, &subtitle_path, &output_path).await?;

    file_response(&output_path, &output_name).await
}

/// Persist the next occurrence of `field_name`, returning the original
/// filename and the temp path.
async fn save_field(
    state: &AppState,
    multipart: &mut Multipart,
    field_name: &str,
) -> AppResult<(String, PathBuf)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some(field_name) {
            return save_bytes(state, field).await;
        }
    }
    Err(AppError::BadRequest(format!(
        "Missing '{field_name}' field"
    )))
}

/// Write one multipart field to the temp directory under a unique name.
async fn save_bytes(
    state: &AppState,
    field: axum::extract::multipart::Field<'_>,
) -> AppResult<(String, PathBuf)> {
    let filename = sanitize_filename(field.file_name().unwrap_or("upload"));
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let path = state
        .storage
        .temp_dir()
        .join(format!("{}_{filename}", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to persist upload: {e}")))?;

    Ok((filename, path))
}

/// Stream a produced file back as an attachment.
async fn file_response(path: &Path, filename: &str) -> AppResult<Response> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to open output: {e}")))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to stat output: {e}")))?
        .len();

    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(format!("Failed to build response: {e}")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/convert", post(convert))
        .route("/burn_subtitles", post(burn_subtitles))
}
