//! Job-id to observer-channel routing.
//!
//! At most one live channel per job id; a client reconnecting to the
//! same job rebinds and the old channel silently stops receiving.
//! The registry owns only the routing relation, never the transport:
//! sessions create and tear down the channels themselves.

use std::collections::HashMap;

use axum::extract::ws::Message;
use murmur_core::job::{JobId, ProgressFrame};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing frames to one observing connection.
pub type ObserverSender = mpsc::UnboundedSender<Message>;

/// Maps each job id to its currently bound observer channel.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared between the worker loop and the WebSocket sessions.
pub struct ProgressRegistry {
    bindings: RwLock<HashMap<JobId, ObserverSender>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Register `sender` as the observer for `job_id`.
    ///
    /// Last writer wins: any prior binding for the id is replaced, which
    /// is what lets a client reconnect without an explicit unbind.
    pub async fn bind(&self, job_id: JobId, sender: ObserverSender) {
        let replaced = self.bindings.write().await.insert(job_id, sender);
        if replaced.is_some() {
            tracing::debug!(%job_id, "Observer channel replaced by new binding");
        }
    }

    /// Remove the binding for `job_id`, but only if `sender` is still
    /// the bound channel.
    ///
    /// Idempotent: a no-op when the id is already unbound or has been
    /// rebound by a newer connection.
    pub async fn unbind(&self, job_id: JobId, sender: &ObserverSender) {
        let mut bindings = self.bindings.write().await;
        if let Some(current) = bindings.get(&job_id) {
            if current.same_channel(sender) {
                bindings.remove(&job_id);
            }
        }
    }

    /// Deliver a progress frame to the channel bound to `job_id`, if any.
    ///
    /// Both a missing binding and a closed channel are silently ignored:
    /// the job runs regardless of whether anyone is watching, and a dead
    /// channel is cleaned up by its own session on disconnect.
    pub async fn publish(&self, job_id: JobId, frame: &ProgressFrame) {
        let bindings = self.bindings.read().await;
        let Some(sender) = bindings.get(&job_id) else {
            return;
        };

        let payload = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(%job_id, error = %e, "Failed to serialize progress frame");
                return;
            }
        };

        if sender.send(Message::Text(payload.into())).is_err() {
            tracing::debug!(%job_id, "Observer channel closed; frame dropped");
        }
    }

    /// Number of currently bound observers, for diagnostics.
    pub async fn watcher_count(&self) -> usize {
        self.bindings.read().await.len()
    }
}

impl Default for ProgressRegistry {
    fn default() -> Self {
        Self::new()
    }
}
