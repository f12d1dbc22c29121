//! Single-consumer worker loop.
//!
//! Drains the job queue forever, one job fully to completion before the
//! next dequeue. This loop is the sole owner of in-flight status: the
//! exclusivity of the shared accelerator is encoded entirely by its
//! strict one-at-a-time structure, so the operation itself needs no
//! lock.

use std::sync::Arc;

use murmur_core::job::{JobEnvelope, ProgressFrame};
use murmur_core::queue::JobReceiver;
use murmur_whisper::Transcriber;
use tokio_util::sync::CancellationToken;

use crate::engine::bridge;
use crate::engine::registry::ProgressRegistry;

/// The background job executor.
///
/// A single long-lived Tokio task that pulls envelopes off the queue
/// and runs them through the execution bridge.
pub struct WorkerLoop {
    receiver: JobReceiver,
    registry: Arc<ProgressRegistry>,
    transcriber: Arc<dyn Transcriber>,
}

impl WorkerLoop {
    pub fn new(
        receiver: JobReceiver,
        registry: Arc<ProgressRegistry>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            receiver,
            registry,
            transcriber,
        }
    }

    /// Run until the cancellation token fires or every queue producer
    /// is dropped.
    ///
    /// An in-flight job always runs to completion; cancellation is only
    /// observed between jobs (in-flight cancellation is unsupported by
    /// design).
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Worker loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Worker loop shutting down");
                    break;
                }
                job = self.receiver.dequeue() => {
                    match job {
                        Some(job) => self.process(job).await,
                        None => {
                            tracing::info!("Job queue closed; worker loop exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Execute one job to its terminal state.
    ///
    /// A failure is fully contained in this job's event stream; the
    /// loop proceeds to the next queued job regardless.
    async fn process(&self, job: JobEnvelope) {
        let job_id = job.id;
        tracing::info!(%job_id, input = %job.input_path.display(), "Job started");

        self.registry
            .publish(job_id, &ProgressFrame::starting())
            .await;

        let (mut updates, handle) = bridge::spawn(Arc::clone(&self.transcriber), &job);

        // Relay every progress callback verbatim (percent clamped to the
        // wire range). The channel closes when the operation returns, so
        // all updates are observed before the terminal frame below.
        while let Some(update) = updates.recv().await {
            let frame = ProgressFrame::stage(
                update.stage,
                bridge::clamp_percent(update.percent),
                update.message,
            );
            self.registry.publish(job_id, &frame).await;
        }

        let terminal = match handle.await {
            Ok(Ok(result)) => {
                tracing::info!(%job_id, segments = result.segments.len(), "Job completed");
                match serde_json::to_value(&result) {
                    Ok(payload) => ProgressFrame::completed(payload),
                    Err(e) => {
                        tracing::error!(%job_id, error = %e, "Failed to serialize result");
                        ProgressFrame::failed(format!("Failed to serialize result: {e}"))
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!(%job_id, error = %e, "Job failed");
                ProgressFrame::failed(e.to_string())
            }
            Err(e) => {
                // The blocking task panicked. Contain it here; the loop
                // must survive to run the next job.
                tracing::error!(%job_id, error = %e, "Transcription task panicked");
                ProgressFrame::failed(format!("Transcription task panicked: {e}"))
            }
        };

        self.registry.publish(job_id, &terminal).await;
    }
}
