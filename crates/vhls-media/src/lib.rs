//! FFmpeg CLI wrapper for HLS video processing.
//!
//! This crate provides:
//! - Streaming SHA-256 content identity for source files
//! - FFprobe source inspection (duration, frame count, dimensions)
//! - Type-safe FFmpeg command building with progress scraping,
//!   cancellation and timeout
//! - Per-resolution rendition transcoding with normalized progress events
//! - HLS segment generation, playlist rewriting and master manifest
//!   assembly
//! - Poster frame extraction, thumbnail frame strips, WebVTT writing

pub mod command;
pub mod error;
pub mod frames;
pub mod fs_utils;
pub mod hash;
pub mod playlist;
pub mod poster;
pub mod probe;
pub mod progress;
pub mod segment;
pub mod transcode;
pub mod vtt;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::extract_frame_strip;
pub use hash::hash_file;
pub use playlist::{rewrite_line, rewrite_playlist, write_master_manifest, RewriteRules};
pub use poster::extract_poster;
pub use probe::{probe_dimensions, probe_duration, probe_frame_count, probe_source, SourceInfo};
pub use progress::{ChannelSink, MemorySink, PercentTracker, ProgressSink, SinkClosed};
pub use segment::build_segments;
pub use transcode::transcode_rendition;
pub use vtt::write_vtt;
