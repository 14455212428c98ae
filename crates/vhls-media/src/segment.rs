//! HLS segment generation.

use std::path::{Path, PathBuf};
use tracing::info;

use vhls_models::{Resolution, SegmentEncoding};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Re-encode `input` at `resolution` into fixed-duration HLS segments.
///
/// Segment files are named `<prefix><index>_<seq>.ts` starting at 0, the
/// playlist keeps all entries (list size 0), and the index playlist lands
/// at `<prefix>.m3u8`, whose path is returned. The playlist still needs a
/// rewrite pass before it is final. No partial cleanup happens on failure.
pub async fn build_segments(
    input: impl AsRef<Path>,
    output_prefix: &str,
    resolution: Resolution,
    encoding: &SegmentEncoding,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();
    let playlist = PathBuf::from(format!("{}.m3u8", output_prefix));

    info!(
        "Building segments: {} -> {} ({})",
        input.display(),
        playlist.display(),
        resolution
    );

    let cmd = FfmpegCommand::new(input, &playlist)
        .output_args(encoding.to_ffmpeg_args())
        .output_arg("-s")
        .output_arg(resolution.to_string())
        .output_arg("-start_number")
        .output_arg("0")
        .output_arg("-hls_time")
        .output_arg(encoding.segment_duration_secs.to_string())
        .output_arg("-hls_list_size")
        .output_arg("0")
        .output_arg("-f")
        .output_arg("hls")
        .output_arg("-hls_segment_filename")
        .output_arg(format!("{}%v_%03d.ts", output_prefix));

    runner.run(&cmd).await?;

    info!("Segment playlist written: {}", playlist.display());
    Ok(playlist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_args() {
        let encoding = SegmentEncoding::default();
        let cmd = FfmpegCommand::new("in.mp4", "segments/abc/abc_720_.m3u8")
            .output_args(encoding.to_ffmpeg_args())
            .output_arg("-s")
            .output_arg(Resolution::new(1280, 720).to_string())
            .output_arg("-hls_time")
            .output_arg(encoding.segment_duration_secs.to_string());

        let args = cmd.build_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"baseline".to_string()));
        assert!(args.contains(&"1280x720".to_string()));
        // fixed 30-second segment duration
        let hls_time = args.iter().position(|a| a == "-hls_time").unwrap();
        assert_eq!(args[hls_time + 1], "30");
    }

    #[test]
    fn test_segment_filename_pattern() {
        let prefix = "segments/abc/abc_720_";
        assert_eq!(format!("{}%v_%03d.ts", prefix), "segments/abc/abc_720_%v_%03d.ts");
        assert_eq!(format!("{}.m3u8", prefix), "segments/abc/abc_720_.m3u8");
    }
}
