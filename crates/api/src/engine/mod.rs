//! The job engine: worker loop, execution bridge, and progress routing.
//!
//! Submission handlers push [`murmur_core::job::JobEnvelope`]s onto the
//! bounded queue; the single [`WorkerLoop`] drains it one job at a time,
//! running the blocking operation through the bridge and publishing
//! progress frames through the [`ProgressRegistry`] to whichever
//! WebSocket channel is currently bound to the job id.

pub mod bridge;
pub mod registry;
pub mod worker;

pub use registry::ProgressRegistry;
pub use worker::WorkerLoop;
