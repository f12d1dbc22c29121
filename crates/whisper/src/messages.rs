//! WhisperX runner output protocol.
//!
//! The runner process writes one JSON object per stdout line with the
//! shape `{"type": "<kind>", ...}`. This module deserializes those
//! lines into a strongly-typed [`RunnerMessage`] enum.

use serde::Deserialize;

use crate::transcript::{TranscriptResult, TranscriptSegment};

/// All known runner output line types.
///
/// Deserialized via the internally-tagged `"type"` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RunnerMessage {
    /// Stage/percent progress during processing.
    #[serde(rename = "progress")]
    Progress(ProgressLine),

    /// Final transcript. Emitted exactly once, as the last line of a
    /// successful run.
    #[serde(rename = "result")]
    Result(ResultLine),

    /// Fatal processing error. The runner exits non-zero afterwards.
    #[serde(rename = "error")]
    Error(ErrorLine),
}

/// Payload for `progress` lines.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressLine {
    pub stage: String,
    /// Raw percent as emitted by the runner; not validated here.
    pub percent: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload for `result` lines.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultLine {
    pub segments: Vec<TranscriptSegment>,
    pub detected_language: String,
}

impl From<ResultLine> for TranscriptResult {
    fn from(line: ResultLine) -> Self {
        Self {
            segments: line.segments,
            detected_language: line.detected_language,
        }
    }
}

/// Payload for `error` lines.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorLine {
    pub error: String,
}

/// Parse one stdout line into a typed message.
///
/// Returns `Err` for malformed JSON or unknown `type` values. Callers
/// should log unknown lines and continue reading.
pub fn parse_line(line: &str) -> Result<RunnerMessage, serde_json::Error> {
    serde_json::from_str(line)
}
