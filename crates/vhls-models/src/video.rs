//! Video metadata records.
//!
//! Persistence lives behind an external metadata store; these are the
//! records the API hands to it (and back to clients).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata for a transcoded/segmented video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    pub title: String,
    /// Artifact base name, `<hash>_<w>_<h>`
    pub name: String,
    /// Content hash of the source bytes
    pub hash: String,
    pub extname: String,
    /// Whether the rendition was handed to the object store
    pub storage: bool,
    /// Whether HLS segments exist for this video
    pub segments: bool,
    /// Poster delivery URL, empty until extracted
    pub poster: String,
    /// Master manifest delivery URL, empty until segmented
    pub url: String,
}

impl VideoRecord {
    /// Record for a freshly transcoded rendition.
    pub fn for_rendition(hash: impl Into<String>, width: u32, height: u32) -> Self {
        let hash = hash.into();
        Self {
            title: String::new(),
            name: format!("{}_{}_{}", hash, width, height),
            hash,
            extname: "mp4".to_string(),
            storage: false,
            segments: false,
            poster: String::new(),
            url: String::new(),
        }
    }
}

/// Metadata for a preprocessed creator upload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadRecord {
    /// Random account key for the uploader
    pub account: String,
    /// Content hash used as the stored name
    pub name: String,
    pub extname: String,
    /// Random per-upload folder key
    pub folder: String,
    /// Frame strip artifact paths
    pub thumbs: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Source aspect ratio (width / height)
    pub ratio: f64,
}
