//! The [`Transcriber`] trait and the WhisperX subprocess implementation.
//!
//! `Transcriber::run` is deliberately blocking: the caller is expected
//! to dispatch it onto a blocking-capable execution context (the worker
//! engine uses `spawn_blocking`) and receive progress through the
//! synchronous callback.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::messages::{parse_line, RunnerMessage};
use crate::transcript::{ProgressUpdate, TranscribeRequest, TranscriptResult};

/// Error type for transcription runs.
#[derive(Debug, thiserror::Error)]
pub enum WhisperError {
    #[error("failed to start whisperx runner: {0}")]
    Spawn(std::io::Error),

    #[error("transcription failed: {0}")]
    ProcessingFailed(String),

    #[error("whisperx runner exited with code {exit_code:?}: {stderr}")]
    ExitedNonZero {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("whisperx runner produced no result")]
    MissingResult,

    #[error("I/O error reading runner output: {0}")]
    Io(#[from] std::io::Error),
}

/// The opaque long-running operation.
///
/// Implementations must be safe to invoke repeatedly in sequence on the
/// same execution context and must perform their own accelerator
/// cleanup on every exit path.
pub trait Transcriber: Send + Sync {
    /// Run one transcription to completion, invoking `on_progress`
    /// synchronously for each stage update.
    fn run(
        &self,
        request: &TranscribeRequest,
        on_progress: &(dyn Fn(ProgressUpdate) + Send + Sync),
    ) -> Result<TranscriptResult, WhisperError>;
}

/// Drives an external WhisperX runner binary.
///
/// The runner receives the job parameters as arguments, writes
/// line-delimited JSON progress and a final result line to stdout (see
/// [`crate::messages`]), and owns all model loading and VRAM cleanup.
pub struct WhisperXCli {
    binary: PathBuf,
}

impl WhisperXCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_command(&self, request: &TranscribeRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--input")
            .arg(&request.input_path)
            .args(["--model", &request.model_size])
            .args(["--language", &request.language]);
        if request.diarize {
            cmd.arg("--diarize");
        }
        if !request.hf_token.is_empty() {
            // The token goes through the environment, not argv.
            cmd.env("HF_TOKEN", &request.hf_token);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Transcriber for WhisperXCli {
    fn run(
        &self,
        request: &TranscribeRequest,
        on_progress: &(dyn Fn(ProgressUpdate) + Send + Sync),
    ) -> Result<TranscriptResult, WhisperError> {
        let mut child = self
            .build_command(request)
            .spawn()
            .map_err(WhisperError::Spawn)?;

        // Drain stderr on a separate thread so a chatty runner cannot
        // fill the pipe and deadlock against our stdout reads.
        let stderr_handle = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let mut result: Option<TranscriptResult> = None;
        let mut runner_error: Option<String> = None;

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(RunnerMessage::Progress(p)) => {
                        on_progress(ProgressUpdate {
                            stage: p.stage,
                            percent: p.percent,
                            message: p.message,
                        });
                    }
                    Ok(RunnerMessage::Result(r)) => {
                        result = Some(r.into());
                    }
                    Ok(RunnerMessage::Error(e)) => {
                        runner_error = Some(e.error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, raw_line = %line, "Unparseable runner output line");
                    }
                }
            }
        }

        let status = child.wait()?;
        let stderr = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if let Some(message) = runner_error {
            return Err(WhisperError::ProcessingFailed(message));
        }
        if !status.success() {
            return Err(WhisperError::ExitedNonZero {
                exit_code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        result.ok_or(WhisperError::MissingResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex;

    /// Write an executable shell script that plays the role of the
    /// runner binary.
    fn fake_runner(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("fake-runner.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{body}").unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn request() -> TranscribeRequest {
        TranscribeRequest {
            input_path: "/tmp/in.wav".into(),
            model_size: "large-v3".into(),
            language: "auto".into(),
            diarize: false,
            hf_token: String::new(),
        }
    }

    #[test]
    fn successful_run_relays_progress_and_returns_result() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = fake_runner(
            tmp.path(),
            r#"echo '{"type":"progress","stage":"loading_model","percent":10}'
echo '{"type":"progress","stage":"transcribing","percent":30,"message":"Transcribing audio..."}'
echo '{"type":"result","detected_language":"en","segments":[{"start":0.0,"end":1.0,"text":"hi","speaker":"Unknown"}]}'"#,
        );

        let updates = Mutex::new(Vec::new());
        let result = WhisperXCli::new(bin)
            .run(&request(), &|u| updates.lock().unwrap().push(u))
            .unwrap();

        assert_eq!(result.detected_language, "en");
        assert_eq!(result.segments.len(), 1);

        let updates = updates.into_inner().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].stage, "loading_model");
        assert_eq!(updates[1].percent, 30);
    }

    #[test]
    fn error_line_wins_over_exit_status() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = fake_runner(
            tmp.path(),
            r#"echo '{"type":"error","error":"CUDA out of memory"}'
exit 1"#,
        );

        let err = WhisperXCli::new(bin).run(&request(), &|_| {}).unwrap_err();
        match err {
            WhisperError::ProcessingFailed(msg) => assert_eq!(msg, "CUDA out of memory"),
            other => panic!("Expected ProcessingFailed, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_exit_captures_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = fake_runner(
            tmp.path(),
            r#"echo 'Traceback: boom' >&2
exit 3"#,
        );

        let err = WhisperXCli::new(bin).run(&request(), &|_| {}).unwrap_err();
        match err {
            WhisperError::ExitedNonZero { exit_code, stderr } => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("Expected ExitedNonZero, got {other:?}"),
        }
    }

    #[test]
    fn clean_exit_without_result_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = fake_runner(tmp.path(), "exit 0");

        let err = WhisperXCli::new(bin).run(&request(), &|_| {}).unwrap_err();
        assert!(matches!(err, WhisperError::MissingResult));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = WhisperXCli::new("/nonexistent/whisperx-runner")
            .run(&request(), &|_| {})
            .unwrap_err();
        assert!(matches!(err, WhisperError::Spawn(_)));
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = fake_runner(
            tmp.path(),
            r#"echo 'INFO: loading weights'
echo '{"type":"result","detected_language":"de","segments":[]}'"#,
        );

        let result = WhisperXCli::new(bin).run(&request(), &|_| {}).unwrap();
        assert_eq!(result.detected_language, "de");
    }
}
