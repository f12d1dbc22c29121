//! Execution bridge between the async runtime and the blocking operation.
//!
//! The transcriber's progress callback fires synchronously on the
//! blocking thread. It must never touch connection-serving state from
//! there, so the bridge hands each update across an unbounded channel
//! whose receiver is drained on the async side. The channel is FIFO and
//! closes when the operation returns, which gives per-job in-order
//! delivery with every progress update observed before the terminal
//! event.

use std::sync::Arc;

use murmur_core::job::JobEnvelope;
use murmur_whisper::{ProgressUpdate, TranscribeRequest, Transcriber, TranscriptResult, WhisperError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Dispatch the blocking operation for `envelope` onto the blocking
/// thread pool.
///
/// Returns the receiver for relayed progress updates and the join
/// handle for the operation's outcome. The receiver yields `None` once
/// the operation has returned and all updates have been drained.
pub fn spawn(
    transcriber: Arc<dyn Transcriber>,
    envelope: &JobEnvelope,
) -> (
    mpsc::UnboundedReceiver<ProgressUpdate>,
    JoinHandle<Result<TranscriptResult, WhisperError>>,
) {
    let request = TranscribeRequest {
        input_path: envelope.input_path.clone(),
        model_size: envelope.options.model_size.clone(),
        language: envelope.options.language.clone(),
        diarize: envelope.options.diarize,
        hf_token: envelope.options.hf_token.clone(),
    };

    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let handle = tokio::task::spawn_blocking(move || {
        // The closure owns the sender: it drops on every exit path,
        // closing the relay channel.
        transcriber.run(&request, &move |update| {
            let _ = update_tx.send(update);
        })
    });

    (update_rx, handle)
}

/// Clamp a raw operation-emitted percent into the 0..=100 wire range.
///
/// Non-monotonic sequences pass through untouched; they can legitimately
/// reflect sub-phase restarts.
pub fn clamp_percent(percent: i64) -> u8 {
    percent.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::job::JobOptions;
    use murmur_whisper::TranscriptSegment;

    struct ScriptedTranscriber {
        updates: Vec<ProgressUpdate>,
        outcome: Result<TranscriptResult, String>,
    }

    impl Transcriber for ScriptedTranscriber {
        fn run(
            &self,
            _request: &TranscribeRequest,
            on_progress: &(dyn Fn(ProgressUpdate) + Send + Sync),
        ) -> Result<TranscriptResult, WhisperError> {
            for update in &self.updates {
                on_progress(update.clone());
            }
            self.outcome
                .clone()
                .map_err(WhisperError::ProcessingFailed)
        }
    }

    fn envelope() -> JobEnvelope {
        JobEnvelope::new("/tmp/in.wav".into(), JobOptions::default())
    }

    fn update(stage: &str, percent: i64) -> ProgressUpdate {
        ProgressUpdate {
            stage: stage.into(),
            percent,
            message: None,
        }
    }

    #[test]
    fn clamp_percent_bounds() {
        assert_eq!(clamp_percent(-5), 0);
        assert_eq!(clamp_percent(0), 0);
        assert_eq!(clamp_percent(42), 42);
        assert_eq!(clamp_percent(100), 100);
        assert_eq!(clamp_percent(250), 100);
    }

    #[tokio::test]
    async fn updates_arrive_in_emission_order_then_channel_closes() {
        let transcriber = Arc::new(ScriptedTranscriber {
            updates: vec![
                update("loading_model", 10),
                update("transcribing", 30),
                update("aligning", 60),
            ],
            outcome: Ok(TranscriptResult {
                segments: vec![],
                detected_language: "en".into(),
            }),
        });

        let (mut rx, handle) = spawn(transcriber, &envelope());

        let mut stages = Vec::new();
        while let Some(u) = rx.recv().await {
            stages.push(u.stage);
        }
        assert_eq!(stages, ["loading_model", "transcribing", "aligning"]);

        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.detected_language, "en");
    }

    #[tokio::test]
    async fn operation_failure_surfaces_through_join_handle() {
        let transcriber = Arc::new(ScriptedTranscriber {
            updates: vec![update("transcribing", 30)],
            outcome: Err("GPU fell off the bus".into()),
        });

        let (mut rx, handle) = spawn(transcriber, &envelope());

        assert_eq!(rx.recv().await.unwrap().stage, "transcribing");
        assert!(rx.recv().await.is_none());

        let err = handle.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("GPU fell off the bus"));
    }

    #[tokio::test]
    async fn request_carries_envelope_options() {
        struct CapturingTranscriber;
        impl Transcriber for CapturingTranscriber {
            fn run(
                &self,
                request: &TranscribeRequest,
                _on_progress: &(dyn Fn(ProgressUpdate) + Send + Sync),
            ) -> Result<TranscriptResult, WhisperError> {
                assert_eq!(request.model_size, "small");
                assert_eq!(request.language, "de");
                assert!(request.diarize);
                assert_eq!(request.hf_token, "hf_secret");
                Ok(TranscriptResult {
                    segments: vec![TranscriptSegment {
                        start: 0.0,
                        end: 1.0,
                        text: "ok".into(),
                        speaker: "Unknown".into(),
                    }],
                    detected_language: "de".into(),
                })
            }
        }

        let job = JobEnvelope::new(
            "/tmp/in.wav".into(),
            JobOptions {
                model_size: "small".into(),
                language: "de".into(),
                diarize: true,
                hf_token: "hf_secret".into(),
            },
        );

        let (_rx, handle) = spawn(Arc::new(CapturingTranscriber), &job);
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.segments.len(), 1);
    }
}
