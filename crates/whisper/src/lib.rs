//! Opaque transcription operation boundary.
//!
//! The rest of the system consumes transcription through the
//! [`Transcriber`] trait: one blocking, resource-exclusive call that
//! reports progress through a synchronous callback and returns a
//! [`TranscriptResult`] or a [`WhisperError`]. The shipped
//! implementation, [`WhisperXCli`], drives an external WhisperX runner
//! process and parses its line-delimited JSON output.

pub mod messages;
pub mod runner;
pub mod transcript;

pub use runner::{Transcriber, WhisperError, WhisperXCli};
pub use transcript::{ProgressUpdate, TranscribeRequest, TranscriptResult, TranscriptSegment};
