//! Segment encoding configuration and artifact layout.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// HLS segment duration in seconds.
pub const SEGMENT_DURATION_SECS: u32 = 30;
/// Nominal bandwidth written into master manifest stream-info lines.
pub const MASTER_BANDWIDTH: u64 = 2_000_000;
/// Query suffix appended to segment references for query-addressed delivery.
pub const DELIVERY_SUFFIX: &str = "?alt=media";

/// Default video codec for segmented renditions.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default H.264 profile.
pub const DEFAULT_PROFILE: &str = "baseline";
/// Default H.264 level.
pub const DEFAULT_LEVEL: &str = "3.0";

/// Frame strip scale width (pixels).
pub const FRAME_STRIP_WIDTH: u32 = 160;

/// Encoding settings for HLS segment generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SegmentEncoding {
    /// Video codec (e.g. "libx264")
    #[serde(default = "default_codec")]
    pub codec: String,

    /// H.264 profile
    #[serde(default = "default_profile")]
    pub profile: String,

    /// H.264 level
    #[serde(default = "default_level")]
    pub level: String,

    /// Segment duration in seconds
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,
}

fn default_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}
fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}
fn default_segment_duration() -> u32 {
    SEGMENT_DURATION_SECS
}

impl Default for SegmentEncoding {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            level: DEFAULT_LEVEL.to_string(),
            segment_duration_secs: SEGMENT_DURATION_SECS,
        }
    }
}

impl SegmentEncoding {
    /// Convert to the ffmpeg output arguments preceding the HLS muxer flags.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-profile:v".to_string(),
            self.profile.clone(),
            "-level".to_string(),
            self.level.clone(),
        ]
    }
}

/// On-disk layout of derived artifacts.
///
/// Directory names are part of the delivery contract: playlist references
/// and metadata URLs embed them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactLayout {
    /// Full renditions
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// HLS segments + playlists, one folder per content hash
    #[serde(default = "default_segments_dir")]
    pub segments_dir: String,

    /// Extracted poster frames
    #[serde(default = "default_posters_dir")]
    pub posters_dir: String,

    /// Upload preview frame strips
    #[serde(default = "default_thumbs_dir")]
    pub thumbs_dir: String,
}

fn default_output_dir() -> String {
    "output".to_string()
}
fn default_segments_dir() -> String {
    "segments".to_string()
}
fn default_posters_dir() -> String {
    "posters".to_string()
}
fn default_thumbs_dir() -> String {
    "thumbs".to_string()
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            segments_dir: default_segments_dir(),
            posters_dir: default_posters_dir(),
            thumbs_dir: default_thumbs_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoding() {
        let enc = SegmentEncoding::default();
        assert_eq!(enc.codec, "libx264");
        assert_eq!(enc.segment_duration_secs, 30);
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = SegmentEncoding::default().to_ffmpeg_args();
        assert!(args.contains(&"-profile:v".to_string()));
        assert!(args.contains(&"baseline".to_string()));
        assert!(args.contains(&"3.0".to_string()));
    }

    #[test]
    fn test_default_layout() {
        let layout = ArtifactLayout::default();
        assert_eq!(layout.output_dir, "output");
        assert_eq!(layout.segments_dir, "segments");
        assert_eq!(layout.posters_dir, "posters");
        assert_eq!(layout.thumbs_dir, "thumbs");
    }
}
