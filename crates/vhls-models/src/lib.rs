//! Shared data models for the vhls backend.
//!
//! This crate provides Serde-serializable types for:
//! - Target resolutions and aspect ratios
//! - Segment encoding configuration and artifact layout constants
//! - WebSocket progress/error message schemas
//! - Chapter blocks for WebVTT generation
//! - Video metadata records

pub mod chapter;
pub mod encoding;
pub mod resolution;
pub mod utils;
pub mod video;
pub mod ws;

// Re-export common types
pub use chapter::Chapter;
pub use encoding::{ArtifactLayout, SegmentEncoding};
pub use resolution::{Resolution, ResolutionError};
pub use utils::generate_key;
pub use video::{UploadRecord, VideoRecord};
pub use ws::{ErrorMessage, TranscodeProgress, TranscriptionProgress};
