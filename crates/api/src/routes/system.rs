//! Read-only system status: accelerator inventory, storage disk usage,
//! and queue diagnostics. None of this touches queue correctness state.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use murmur_core::hardware::{self, GpuInfo, StorageInfo};
use serde::Serialize;

use crate::state::AppState;

/// Snapshot of the queue for diagnostics. `depth` may be stale by the
/// time the client reads it.
#[derive(Debug, Serialize)]
pub struct QueueInfo {
    pub depth: usize,
    pub capacity: usize,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub gpu: GpuInfo,
    pub storage: StorageInfo,
    pub queue: QueueInfo,
}

/// GET /api/v1/system/status
async fn status(State(state): State<AppState>) -> Json<SystemStatus> {
    let gpu = hardware::probe_gpu().await;
    let storage = hardware::probe_storage(state.storage.root()).await;

    Json(SystemStatus {
        gpu,
        storage,
        queue: QueueInfo {
            depth: state.queue.depth(),
            capacity: state.queue.capacity(),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}
