//! Thumbnail frame strips for upload previews.

use std::path::Path;
use tokio::fs;
use tracing::info;

use vhls_models::encoding::FRAME_STRIP_WIDTH;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Extract one frame per second of the source, scaled down to the strip
/// width, as `<out_dir>/frame_NNN.jpg`.
pub async fn extract_frame_strip(
    video: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let video = video.as_ref();
    let out_dir = out_dir.as_ref();

    fs::create_dir_all(out_dir).await?;

    let output = out_dir.join("frame_%03d.jpg");

    info!(
        "Extracting frame strip: {} -> {}",
        video.display(),
        out_dir.display()
    );

    let cmd = FfmpegCommand::new(video, &output)
        .video_filter(format!(
            "select='not(mod(t,1))',scale={}:-1",
            FRAME_STRIP_WIDTH
        ))
        .output_arg("-vsync")
        .output_arg("vfr")
        .output_arg("-q:v")
        .output_arg("2");

    runner.run(&cmd).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_strip_filter() {
        let filter = format!("select='not(mod(t,1))',scale={}:-1", FRAME_STRIP_WIDTH);
        assert_eq!(filter, "select='not(mod(t,1))',scale=160:-1");
    }
}
