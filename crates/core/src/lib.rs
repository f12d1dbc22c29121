//! Domain types and leaf logic for the murmur transcription server.
//!
//! Everything in this crate is independent of the HTTP layer: the job
//! envelope and progress frame types, the bounded task queue, storage
//! path handling, hardware probes, and the ffmpeg command layer.

pub mod error;
pub mod ffmpeg;
pub mod hardware;
pub mod job;
pub mod queue;
pub mod storage;
