//! FFprobe source inspection.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Probed facts about a source file. Read-only once probed; sources are
/// re-probed per request, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Source path as probed
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Frame count of the first video stream, when the container reports one
    pub frame_count: Option<u64>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Derived aspect ratio (width / height)
    pub aspect_ratio: f64,
}

/// Probe a source file for duration, frame count and dimensions.
pub async fn probe_source(path: impl AsRef<Path>) -> MediaResult<SourceInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let duration = probe_duration(path).await?;
    let frame_count = probe_frame_count(path).await?;
    let (width, height) = probe_dimensions(path).await?;

    Ok(SourceInfo {
        path: path.to_path_buf(),
        duration,
        frame_count,
        width,
        height,
        aspect_ratio: width as f64 / height as f64,
    })
}

/// Query the container duration as seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let output = run_ffprobe(&[
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ], path.as_ref())
    .await?;

    output
        .trim()
        .parse()
        .map_err(|_| MediaError::ffprobe_failed(format!("unparsable duration: {:?}", output.trim()), None))
}

/// Query the frame count of the first video stream. Containers without a
/// frame count report `N/A`, which maps to `None`.
pub async fn probe_frame_count(path: impl AsRef<Path>) -> MediaResult<Option<u64>> {
    let output = run_ffprobe(&[
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=nb_frames",
        "-of",
        "default=nokey=1:noprint_wrappers=1",
    ], path.as_ref())
    .await?;

    let value = output.trim();
    if value.is_empty() || value == "N/A" {
        return Ok(None);
    }

    value
        .parse()
        .map(Some)
        .map_err(|_| MediaError::ffprobe_failed(format!("unparsable frame count: {:?}", value), None))
}

/// Query the pixel dimensions of the first video stream as a `WxH` token.
pub async fn probe_dimensions(path: impl AsRef<Path>) -> MediaResult<(u32, u32)> {
    let output = run_ffprobe(&[
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=width,height",
        "-of",
        "csv=s=x:p=0",
    ], path.as_ref())
    .await?;

    let token = output.trim();
    let (w, h) = token
        .split_once('x')
        .ok_or_else(|| MediaError::ffprobe_failed(format!("unparsable dimensions: {:?}", token), None))?;

    let width: u32 = w
        .parse()
        .map_err(|_| MediaError::ffprobe_failed(format!("unparsable width: {:?}", w), None))?;
    let height: u32 = h
        .parse()
        .map_err(|_| MediaError::ffprobe_failed(format!("unparsable height: {:?}", h), None))?;

    if height == 0 {
        return Err(MediaError::InvalidVideo(
            "video stream reports zero height".to_string(),
        ));
    }

    Ok((width, height))
}

async fn run_ffprobe(args: &[&str], path: &Path) -> MediaResult<String> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("ffprobe failed for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_derivation() {
        let info = SourceInfo {
            path: PathBuf::from("test.mp4"),
            duration: 120.0,
            frame_count: Some(3000),
            width: 1920,
            height: 1080,
            aspect_ratio: 1920.0 / 1080.0,
        };
        assert!((info.aspect_ratio - 16.0 / 9.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_source("/nonexistent/video.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
