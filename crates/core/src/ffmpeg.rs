//! FFmpeg shell-out layer for the toolbox operations.
//!
//! Command construction is kept separate from execution so the argument
//! lists are unit-testable without an ffmpeg binary present.

use std::path::Path;
use std::process::Stdio;

/// Error type for ffmpeg operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("input file not found: {0}")]
    InputNotFound(String),
}

/// Video codecs selectable for conversion. Anything containing `nvenc`
/// in the request maps to the hardware encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// Software x264, `-crf 23`.
    Libx264,
    /// NVIDIA hardware encoder, `-preset p4`.
    H264Nvenc,
}

impl VideoCodec {
    /// Resolve a client-supplied codec name.
    pub fn from_request(codec: &str) -> Self {
        if codec.contains("nvenc") {
            Self::H264Nvenc
        } else {
            Self::Libx264
        }
    }
}

/// Build the argument list for a container/codec conversion.
pub fn convert_args(input: &Path, output: &Path, codec: VideoCodec) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ];

    match codec {
        VideoCodec::H264Nvenc => {
            args.extend(["-c:v", "h264_nvenc", "-preset", "p4"].map(String::from));
        }
        VideoCodec::Libx264 => {
            args.extend(["-c:v", "libx264", "-crf", "23"].map(String::from));
        }
    }

    args.push(output.to_string_lossy().to_string());
    args
}

/// Build the argument list for burning subtitles into a video.
///
/// Uses the `subtitles` filter with a fixed font size; audio is copied
/// untouched.
pub fn burn_subtitles_args(video: &Path, subtitle: &Path, output: &Path) -> Vec<String> {
    let filter = format!(
        "subtitles='{}':force_style='FontSize=24'",
        escape_filter_path(subtitle)
    );

    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-vf".to_string(),
        filter,
        "-c:v".to_string(),
        "libx264".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Escape a path for use inside an ffmpeg filter expression. Colons are
/// option separators in filter syntax and must be backslash-escaped.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace(':', "\\:")
}

/// Run ffmpeg with the given arguments, capturing stderr for diagnostics.
pub async fn run_ffmpeg(args: &[String]) -> Result<(), FfmpegError> {
    let output = tokio::process::Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Convert `input` to `output` with the requested codec.
pub async fn convert(input: &Path, output: &Path, codec: VideoCodec) -> Result<(), FfmpegError> {
    if !input.exists() {
        return Err(FfmpegError::InputNotFound(
            input.to_string_lossy().to_string(),
        ));
    }
    run_ffmpeg(&convert_args(input, output, codec)).await
}

/// Burn `subtitle` into `video`, writing the result to `output`.
pub async fn burn_subtitles(
    video: &Path,
    subtitle: &Path,
    output: &Path,
) -> Result<(), FfmpegError> {
    if !video.exists() {
        return Err(FfmpegError::InputNotFound(
            video.to_string_lossy().to_string(),
        ));
    }
    if !subtitle.exists() {
        return Err(FfmpegError::InputNotFound(
            subtitle.to_string_lossy().to_string(),
        ));
    }
    run_ffmpeg(&burn_subtitles_args(video, subtitle, output)).await
}
