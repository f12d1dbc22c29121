//! Job envelope and progress frame types.
//!
//! A [`JobEnvelope`] is the immutable record of one submitted unit of
//! work. It is created at submission time and ownership moves from the
//! submitter to the queue to the worker; nothing mutates it afterwards.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque job identifier, generated at submission, stable for the job's
/// lifetime.
pub type JobId = Uuid;

// ---------------------------------------------------------------------------
// Stage names
// ---------------------------------------------------------------------------

/// Emitted by the worker before the operation starts.
pub const STAGE_STARTING: &str = "starting";

/// Terminal stage for a successful job.
pub const STAGE_COMPLETED: &str = "completed";

/// Terminal stage for a failed job.
pub const STAGE_ERROR: &str = "error";

// ---------------------------------------------------------------------------
// JobEnvelope
// ---------------------------------------------------------------------------

/// Parameters for one transcription job, passed through verbatim to the
/// operation. The queue never inspects these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    /// Whisper model size, e.g. `large-v3`.
    #[serde(default = "default_model_size")]
    pub model_size: String,
    /// Language hint; `auto` means autodetect.
    #[serde(default = "default_language")]
    pub language: String,
    /// Whether to run speaker diarization.
    #[serde(default)]
    pub diarize: bool,
    /// HuggingFace token, required only when `diarize` is set.
    #[serde(default)]
    pub hf_token: String,
}

fn default_model_size() -> String {
    "large-v3".into()
}

fn default_language() -> String {
    "auto".into()
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            model_size: default_model_size(),
            language: default_language(),
            diarize: false,
            hf_token: String::new(),
        }
    }
}

/// One submitted unit of work: identity, a reference to already-persisted
/// input, and the pass-through parameter set.
#[derive(Debug, Clone)]
pub struct JobEnvelope {
    pub id: JobId,
    /// Path to the persisted input file. The submitter is responsible
    /// for writing it before enqueueing.
    pub input_path: PathBuf,
    pub options: JobOptions,
    pub submitted_at: DateTime<Utc>,
}

impl JobEnvelope {
    /// Create an envelope with a freshly generated id.
    pub fn new(input_path: PathBuf, options: JobOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_path,
            options,
            submitted_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressFrame
// ---------------------------------------------------------------------------

/// One progress update about a job, as delivered to observers.
///
/// Wire shape: `{status, progress, message?, result?, error?}`. Frames
/// are transient -- never persisted, delivered at-most-once, and lost if
/// no observer is bound when they are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressFrame {
    /// Short symbolic stage tag (`starting`, `transcribing`, ...).
    pub status: String,
    /// Completion percentage, clamped to 0..=100 at the bridge boundary.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressFrame {
    /// A non-terminal stage update.
    pub fn stage(status: impl Into<String>, progress: u8, message: Option<String>) -> Self {
        Self {
            status: status.into(),
            progress,
            message,
            result: None,
            error: None,
        }
    }

    /// The initial frame published before the operation starts.
    pub fn starting() -> Self {
        Self::stage(STAGE_STARTING, 0, None)
    }

    /// Terminal success frame carrying the result payload.
    pub fn completed(result: serde_json::Value) -> Self {
        Self {
            status: STAGE_COMPLETED.into(),
            progress: 100,
            message: None,
            result: Some(result),
            error: None,
        }
    }

    /// Terminal failure frame carrying the error description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: STAGE_ERROR.into(),
            progress: 0,
            message: None,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Whether this frame ends the job's event stream.
    pub fn is_terminal(&self) -> bool {
        self.status == STAGE_COMPLETED || self.status == STAGE_ERROR
    }
}
