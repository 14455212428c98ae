//! WebSocket message schemas.
//!
//! Field names follow the wire contract of the original service; clients
//! depend on them verbatim. Note the historical key swap on the progress
//! message: `resolutions` carries the total count and `totalResolutions`
//! the zero-based index of the resolution currently encoding.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resolution::Resolution;

/// Per-line transcode progress for one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscodeProgress {
    /// False when carrying a terminal failure
    pub success: bool,
    /// Human-readable error, empty on success
    pub error: String,
    /// Total number of resolutions in the request
    #[serde(rename = "resolutions")]
    pub total: usize,
    /// Zero-based index of the resolution this event belongs to
    #[serde(rename = "totalResolutions")]
    pub index: usize,
    /// Percent complete in [0, 100]
    pub progress: f64,
    /// Target size as `["W", "H"]`
    pub size: Vec<String>,
}

impl TranscodeProgress {
    /// Progress update for resolution `index` of `total`.
    pub fn update(resolution: Resolution, index: usize, total: usize, percent: f64) -> Self {
        Self {
            success: true,
            error: String::new(),
            total,
            index,
            progress: percent.clamp(0.0, 100.0),
            size: resolution.size_tokens(),
        }
    }

    /// Terminal event marking resolution `index` as complete.
    pub fn completed(resolution: Resolution, index: usize, total: usize) -> Self {
        Self::update(resolution, index, total, 100.0)
    }

    /// Terminal failure event for resolution `index`.
    pub fn failed(
        resolution: Resolution,
        index: usize,
        total: usize,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: error.into(),
            total,
            index,
            progress: 0.0,
            size: resolution.size_tokens(),
        }
    }

    /// Whether this event terminates its resolution's run.
    pub fn is_terminal(&self) -> bool {
        !self.success || self.progress >= 100.0
    }
}

/// Generic error delivered over the same channel as progress.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorMessage {
    pub success: bool,
    /// Human-readable description of the failing step
    pub message: String,
    /// Opaque underlying error string
    pub error: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: error.into(),
        }
    }
}

/// Progress message for the speech-transcription flow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptionProgress {
    pub success: bool,
    pub message: String,
    /// File the transcription run is currently producing
    pub file: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_wire_keys() {
        let msg = TranscodeProgress::update(Resolution::new(1280, 720), 1, 3, 42.5);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"resolutions\":3"));
        assert!(json.contains("\"totalResolutions\":1"));
        assert!(json.contains("\"progress\":42.5"));
        assert!(json.contains("\"size\":[\"1280\",\"720\"]"));
    }

    #[test]
    fn test_progress_clamped() {
        let msg = TranscodeProgress::update(Resolution::new(640, 480), 0, 1, 104.2);
        assert_eq!(msg.progress, 100.0);
        assert!(msg.is_terminal());
    }

    #[test]
    fn test_failed_is_terminal() {
        let msg = TranscodeProgress::failed(Resolution::new(640, 480), 0, 1, "boom");
        assert!(msg.is_terminal());
        assert!(!msg.success);
        assert_eq!(msg.error, "boom");
    }

    #[test]
    fn test_error_message_shape() {
        let msg = ErrorMessage::new("probe failed", "exit status 1");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"message\":\"probe failed\""));
        assert!(json.contains("\"error\":\"exit status 1\""));
    }
}
