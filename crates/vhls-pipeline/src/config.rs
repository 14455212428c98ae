//! Pipeline configuration.
//!
//! All former process-wide constants (directory names, segment duration,
//! manifest bandwidth, delivery suffix) live here and are passed into the
//! pipeline at construction.

use std::path::PathBuf;

use vhls_models::encoding::{DELIVERY_SUFFIX, MASTER_BANDWIDTH};
use vhls_models::{ArtifactLayout, SegmentEncoding};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory under which all artifact folders live
    pub artifact_root: PathBuf,
    /// Artifact folder names (output/segments/posters/thumbs)
    pub layout: ArtifactLayout,
    /// Segment encoding profile
    pub encoding: SegmentEncoding,
    /// Nominal bandwidth written into master manifests
    pub bandwidth: u64,
    /// Delivery query suffix for rewritten playlist references
    pub delivery_suffix: String,
    /// Per-subprocess timeout in seconds, if any
    pub job_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("."),
            layout: ArtifactLayout::default(),
            encoding: SegmentEncoding::default(),
            bandwidth: MASTER_BANDWIDTH,
            delivery_suffix: DELIVERY_SUFFIX.to_string(),
            job_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut encoding = SegmentEncoding::default();
        if let Some(secs) = std::env::var("VHLS_SEGMENT_DURATION")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            encoding.segment_duration_secs = secs;
        }

        Self {
            artifact_root: std::env::var("VHLS_ARTIFACT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            layout: ArtifactLayout::default(),
            encoding,
            bandwidth: std::env::var("VHLS_BANDWIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MASTER_BANDWIDTH),
            delivery_suffix: DELIVERY_SUFFIX.to_string(),
            job_timeout_secs: std::env::var("VHLS_JOB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Absolute path of the renditions folder.
    pub fn output_dir(&self) -> PathBuf {
        self.artifact_root.join(&self.layout.output_dir)
    }

    /// Absolute path of a video's segment folder.
    pub fn segment_dir(&self, hash: &str) -> PathBuf {
        self.artifact_root.join(&self.layout.segments_dir).join(hash)
    }

    /// Absolute path of the posters folder.
    pub fn posters_dir(&self) -> PathBuf {
        self.artifact_root.join(&self.layout.posters_dir)
    }

    /// Absolute path of an upload's frame strip folder.
    pub fn thumbs_dir(&self, folder: &str) -> PathBuf {
        self.artifact_root.join(&self.layout.thumbs_dir).join(folder)
    }
}
