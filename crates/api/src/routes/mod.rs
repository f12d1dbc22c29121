pub mod health;
pub mod system;
pub mod toolbox;
pub mod transcribe;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /transcribe/upload             submit a job (POST, multipart)
/// /transcribe/ws/{job_id}        observation WebSocket
///
/// /system/status                 GPU + disk + queue diagnostics
///
/// /toolbox/convert               container/codec conversion (POST)
/// /toolbox/burn_subtitles        hard-sub burning (POST)
/// ```
///
/// The request timeout applies only to the quick read-only routes:
/// uploads and toolbox conversions scale with media size, and the
/// WebSocket session outlives any sensible request deadline.
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    Router::new()
        .nest("/transcribe", transcribe::router())
        .nest(
            "/system",
            system::router().layer(TimeoutLayer::new(request_timeout)),
        )
        .nest("/toolbox", toolbox::router())
}
