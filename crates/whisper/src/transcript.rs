//! Request, result, and progress types for the transcription operation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// Stage names emitted by the runner, in pipeline order.
pub const STAGE_LOADING_MODEL: &str = "loading_model";
pub const STAGE_TRANSCRIBING: &str = "transcribing";
pub const STAGE_ALIGNING: &str = "aligning";
pub const STAGE_DIARIZING: &str = "diarizing";
pub const STAGE_SAVING: &str = "saving";

/// Everything the operation needs for one run.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub input_path: PathBuf,
    pub model_size: String,
    /// `auto` means language autodetection.
    pub language: String,
    pub diarize: bool,
    pub hf_token: String,
}

/// One progress callback payload, passed through verbatim from the
/// operation. `percent` is raw here; range policy is applied by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub stage: String,
    pub percent: i64,
    pub message: Option<String>,
}

/// A single transcript segment with word-aligned timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Segment start in seconds.
    pub start: f64,
    /// Segment end in seconds.
    pub end: f64,
    pub text: String,
    /// Speaker label when diarization ran; `Unknown` otherwise.
    #[serde(default = "unknown_speaker")]
    pub speaker: String,
}

fn unknown_speaker() -> String {
    "Unknown".into()
}

/// Final payload of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptResult {
    pub segments: Vec<TranscriptSegment>,
    pub detected_language: String,
}
