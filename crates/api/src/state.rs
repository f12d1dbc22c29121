use std::sync::Arc;

use murmur_core::queue::JobQueue;
use murmur_core::storage::StorageLayout;

use crate::config::ServerConfig;
use crate::engine::ProgressRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Producer handle for the bounded job queue.
    pub queue: JobQueue,
    /// Job-id to observer-channel routing table.
    pub registry: Arc<ProgressRegistry>,
    /// Upload/output directory layout.
    pub storage: StorageLayout,
}
