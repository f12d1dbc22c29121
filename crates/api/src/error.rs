use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use murmur_core::error::CoreError;
use murmur_core::ffmpeg::FfmpegError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `murmur_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An ffmpeg toolbox failure.
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::QueueFull { capacity } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "QUEUE_FULL",
                    format!("Transcription queue is full ({capacity} jobs); try again later"),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Toolbox errors ---
            AppError::Ffmpeg(err) => classify_ffmpeg_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify an ffmpeg error into an HTTP status, error code, and message.
///
/// Execution failures carry the captured stderr so clients can see what
/// ffmpeg complained about; a missing binary is a server-side problem.
fn classify_ffmpeg_error(err: &FfmpegError) -> (StatusCode, &'static str, String) {
    match err {
        FfmpegError::InputNotFound(path) => (
            StatusCode::BAD_REQUEST,
            "INPUT_NOT_FOUND",
            format!("Input file not found: {path}"),
        ),
        FfmpegError::ExecutionFailed { exit_code, stderr } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "FFMPEG_FAILED",
            format!("FFmpeg failed (exit code {exit_code:?}): {stderr}"),
        ),
        FfmpegError::NotFound(e) => {
            tracing::error!(error = %e, "ffmpeg binary not found");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
