//! Poster frame extraction.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Extract a single frame at `timestamp` into `<out_dir>/<key>.jpg`.
///
/// The output directory is created if absent. Re-extracting with the same
/// key overwrites the same path.
pub async fn extract_poster(
    video: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    timestamp: &str,
    key: &str,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    let video = video.as_ref();
    let out_dir = out_dir.as_ref();

    fs::create_dir_all(out_dir).await?;

    let output = out_dir.join(format!("{}.jpg", key));

    info!(
        "Extracting poster: {} @ {} -> {}",
        video.display(),
        timestamp,
        output.display()
    );

    let cmd = FfmpegCommand::new(video, &output)
        .seek(timestamp)
        .single_frame();

    runner.run(&cmd).await?;

    Ok(output)
}
